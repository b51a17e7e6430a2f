use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

/// Access tokens live 15 minutes, or 7 days when the user asked to be
/// remembered.
pub fn access_ttl(remember_me: bool) -> Duration {
    if remember_me {
        Duration::days(7)
    } else {
        Duration::minutes(15)
    }
}

/// Refresh tokens live 7 days, or 30 days when remembered.
pub fn refresh_ttl(remember_me: bool) -> Duration {
    if remember_me {
        Duration::days(30)
    } else {
        Duration::days(7)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, ttl: Duration) -> Self {
        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            exp: (Utc::now() + ttl).timestamp(),
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}
