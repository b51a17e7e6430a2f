pub mod auth;
pub mod billing;
pub mod config;
pub mod currency;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod sweeper;
pub mod ticker;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::rate_limit::{ResendRateLimiter, SigninRateLimiter};
use crate::state::{AppState, SharedState};
use crate::ticker::SecondsCounter;

const MAX_BODY_SIZE: usize = 64 * 1024;

/// Build shared state. Must run inside a Tokio runtime: the uptime counter
/// spawns its timer task here.
pub fn build_state(pool: PgPool, config: Config) -> SharedState {
    let system_mailer = config.smtp.as_ref().and_then(|smtp| {
        match SystemMailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("System SMTP configured");
                Some(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("System SMTP not available: {e}");
                None
            }
        }
    });

    Arc::new(AppState {
        pool,
        config,
        system_mailer,
        signin_limiter: SigninRateLimiter::new(),
        resend_limiter: ResendRateLimiter::new(),
        uptime: SecondsCounter::start(),
    })
}

pub fn build_app(state: SharedState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .route("/api/v1/status", axum::routing::get(status))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.uptime.get(),
    }))
}
