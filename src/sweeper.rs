use std::time::Duration;

use tokio::sync::watch;

use crate::db;
use crate::state::SharedState;

/// Rate limiter entries older than this are dropped on each sweep.
const LIMITER_MAX_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub email_verifications: u64,
    pub password_resets: u64,
    pub refresh_tokens: u64,
}

/// Periodically purge expired and consumed token records until shutdown is
/// signaled.
pub async fn run(state: SharedState, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    tracing::debug!("Token sweeper started (every {}s)", interval.as_secs());

    loop {
        if *shutdown.borrow() {
            break;
        }

        match sweep_once(&state).await {
            Ok(report) => {
                tracing::debug!(
                    "Swept {} email verifications, {} password resets, {} refresh tokens",
                    report.email_verifications,
                    report.password_resets,
                    report.refresh_tokens
                );
            }
            Err(e) => tracing::error!("Token sweep failed: {e}"),
        }

        state.signin_limiter.cleanup(LIMITER_MAX_AGE);
        state.resend_limiter.cleanup(LIMITER_MAX_AGE);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::debug!("Token sweeper stopped");
}

pub async fn sweep_once(state: &SharedState) -> Result<SweepReport, sqlx::Error> {
    Ok(SweepReport {
        email_verifications: db::email_verifications::delete_expired(&state.pool).await?,
        password_resets: db::password_resets::delete_spent(&state.pool).await?,
        refresh_tokens: db::refresh_tokens::delete_expired(&state.pool).await?,
    })
}
