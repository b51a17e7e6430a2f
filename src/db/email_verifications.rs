use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::EmailVerification;

/// Replace any pending verification for the user with a fresh one.
pub async fn replace_for_user(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<EmailVerification, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM email_verifications WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let record = sqlx::query_as::<_, EmailVerification>(
        "INSERT INTO email_verifications (user_id, token_hash, expires_at)
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

/// Delete and return the record if it is still valid. The delete is the
/// consumption, so two concurrent requests cannot both succeed.
pub async fn consume_valid_by_hash<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    token_hash: &str,
) -> Result<Option<EmailVerification>, sqlx::Error> {
    sqlx::query_as::<_, EmailVerification>(
        "DELETE FROM email_verifications
         WHERE token_hash = $1 AND expires_at > now()
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
) -> Result<Option<EmailVerification>, sqlx::Error> {
    sqlx::query_as::<_, EmailVerification>(
        "SELECT * FROM email_verifications WHERE token_hash = $1",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM email_verifications WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
