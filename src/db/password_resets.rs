use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PasswordReset;

/// Replace any outstanding reset for the user with a fresh one.
pub async fn replace_for_user(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<PasswordReset, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let record = sqlx::query_as::<_, PasswordReset>(
        "INSERT INTO password_resets (user_id, token_hash, expires_at)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(record)
}

/// Flip `used` on a valid record and return it. Returns `None` when the token
/// is unknown, expired or already used.
pub async fn consume_valid_by_hash<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    token_hash: &str,
) -> Result<Option<PasswordReset>, sqlx::Error> {
    sqlx::query_as::<_, PasswordReset>(
        "UPDATE password_resets SET used = true
         WHERE token_hash = $1 AND used = false AND expires_at > now()
         RETURNING *",
    )
    .bind(token_hash)
    .fetch_optional(executor)
    .await
}

/// Look a record up without consuming it, for inspection only.
pub async fn find_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<PasswordReset>, sqlx::Error> {
    sqlx::query_as::<_, PasswordReset>("SELECT * FROM password_resets WHERE token_hash = $1")
        .bind(token_hash)
        .fetch_optional(pool)
        .await
}

pub async fn delete_spent(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM password_resets WHERE used = true OR expires_at <= now()")
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
