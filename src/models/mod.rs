pub mod email_verification;
pub mod password_reset;
pub mod refresh_token;
pub mod user;

pub use email_verification::EmailVerification;
pub use password_reset::PasswordReset;
pub use refresh_token::RefreshToken;
pub use user::User;
