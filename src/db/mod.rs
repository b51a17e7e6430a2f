pub mod email_verifications;
pub mod password_resets;
pub mod refresh_tokens;
pub mod users;
