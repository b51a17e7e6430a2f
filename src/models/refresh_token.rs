use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub used: bool,
    /// Long-lived session; rotation keeps the extended lifetimes.
    pub remember_me: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
