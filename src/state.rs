use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::rate_limit::{ResendRateLimiter, SigninRateLimiter};
use crate::ticker::SecondsCounter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub system_mailer: Option<Arc<SystemMailer>>,
    pub signin_limiter: SigninRateLimiter,
    pub resend_limiter: ResendRateLimiter,
    pub uptime: SecondsCounter,
}
