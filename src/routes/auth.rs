use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{self, Claims, encode_token};
use crate::auth::{password, token};
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct VerifyEmailResponse {
    pub message: String,
    #[serde(flatten)]
    pub auth: AuthResponse,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

fn auth_cookies(
    access_token: &str,
    refresh_token: &str,
    access_ttl: Duration,
    refresh_ttl: Duration,
) -> CookieJar {
    let access = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(access_ttl.num_seconds()))
        .build();

    let refresh = Cookie::build(("refresh_token", refresh_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(refresh_ttl.num_seconds()))
        .build();

    CookieJar::new().add(access).add(refresh)
}

fn clear_auth_cookies() -> CookieJar {
    let access = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build(("refresh_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(' '),
        None => false,
    }
}

/// Issue an access token and a stored refresh token for the user.
async fn start_session(
    state: &SharedState,
    user: User,
    remember_me: bool,
) -> Result<(CookieJar, AuthResponse), AppError> {
    let access_ttl = jwt::access_ttl(remember_me);
    let refresh_ttl = jwt::refresh_ttl(remember_me);

    let claims = Claims::for_user(&user, access_ttl);
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh = token::generate();
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &token::hash(&refresh),
        remember_me,
        Utc::now() + refresh_ttl,
    )
    .await?;

    let jar = auth_cookies(&access_token, &refresh, access_ttl, refresh_ttl);
    Ok((
        jar,
        AuthResponse {
            access_token,
            refresh_token: refresh,
            user,
        },
    ))
}

/// Store a fresh verification token for the user and mail the link in the
/// background. Earlier tokens for the user stop working.
async fn issue_verification(state: &SharedState, user: &User) -> Result<(), AppError> {
    let raw = token::generate();
    let ttl = state.config.verification_ttl;

    db::email_verifications::replace_for_user(
        &state.pool,
        user.id,
        &token::hash(&raw),
        Utc::now() + ttl,
    )
    .await?;

    let verify_url = format!("{}/auth/verify-email?token={raw}", state.config.frontend_url);
    let mailer = state.system_mailer.clone();
    let email = user.email.clone();
    let name = user.name.clone();

    tokio::spawn(async move {
        match mailer {
            Some(mailer) => {
                if let Err(e) = mailer
                    .send_verification(&email, &name, &verify_url, ttl.num_minutes())
                    .await
                {
                    tracing::error!("Failed to send verification email to {email}: {e}");
                }
            }
            None => {
                tracing::warn!("System SMTP not configured. Verification link for {email}: {verify_url}");
            }
        }
    });

    Ok(())
}

pub async fn signup(
    State(state): State<SharedState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    let email = normalize_email(&req.email);
    if !is_plausible_email(&email) {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    password::check_length(&req.password).map_err(AppError::BadRequest)?;

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = match db::users::create(&state.pool, &email, &pw_hash, &name).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    issue_verification(&state, &user).await?;
    tracing::info!("User {} signed up", user.id);

    Ok(Json(SignupResponse {
        message: "User created successfully. Please check your email to verify your account."
            .to_string(),
        user,
    }))
}

pub async fn signin(
    State(state): State<SharedState>,
    Json(req): Json<SigninRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email);

    if state.signin_limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many sign-in attempts. Please try again later.".to_string(),
        ));
    }

    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        state.signin_limiter.record_failure(&email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is deactivated".to_string()));
    }

    if !user.is_verified {
        return Err(AppError::Forbidden(
            "Please verify your email before signing in".to_string(),
        ));
    }

    state.signin_limiter.clear(&email);

    let (jar, response) = start_session(&state, user, req.remember_me).await?;
    Ok((jar, Json(response)))
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let refresh_value = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let refresh_hash = token::hash(&refresh_value);

    let Some(stored) =
        db::refresh_tokens::consume_valid_by_hash(&state.pool, &refresh_hash).await?
    else {
        let known = db::refresh_tokens::find_by_hash(&state.pool, &refresh_hash)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        if known.used {
            tracing::warn!(
                "Refresh token reuse detected for user {}. Revoking all sessions.",
                known.user_id
            );
            db::refresh_tokens::delete_all_for_user(&state.pool, known.user_id).await?;
            return Err(AppError::Unauthorized(
                "Refresh token reuse detected. All sessions revoked.".to_string(),
            ));
        }

        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    };

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    let (jar, response) = start_session(&state, user, stored.remember_me).await?;
    Ok((jar, Json(response)))
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        db::refresh_tokens::delete_by_hash(&state.pool, &token::hash(cookie.value())).await?;
    }

    Ok((clear_auth_cookies(), MessageResponse::new("Logged out successfully")))
}

pub async fn me(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn verify_email(
    State(state): State<SharedState>,
    Json(req): Json<TokenRequest>,
) -> Result<(CookieJar, Json<VerifyEmailResponse>), AppError> {
    let mut tx = state.pool.begin().await?;

    let record = db::email_verifications::consume_valid_by_hash(&mut *tx, &token::hash(&req.token))
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Invalid or expired verification token".to_string())
        })?;

    let user = db::users::mark_verified(&mut *tx, record.user_id).await?;
    tx.commit().await?;

    tracing::info!("Email verified for user {}", user.id);

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is deactivated".to_string()));
    }

    let (jar, auth) = start_session(&state, user, false).await?;
    Ok((
        jar,
        Json(VerifyEmailResponse {
            message: "Email verified successfully".to_string(),
            auth,
        }),
    ))
}

pub async fn resend_verification(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email);

    if state.resend_limiter.hit(&email, addr.ip()).is_err() {
        return Err(AppError::RateLimited(
            "Too many requests. Please try again later.".to_string(),
        ));
    }

    let generic = "If that account exists and is unverified, a verification email has been sent.";

    let Some(user) = db::users::find_by_email(&state.pool, &email).await? else {
        return Ok(MessageResponse::new(generic));
    };

    if user.is_verified {
        return Ok(MessageResponse::new("Email is already verified"));
    }

    issue_verification(&state, &user).await?;
    Ok(MessageResponse::new(generic))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // Same answer whether or not the email is registered
    let response =
        MessageResponse::new("If an account exists with this email, a password reset link has been sent.");

    let email = normalize_email(&req.email);
    let pool = state.pool.clone();
    let mailer = state.system_mailer.clone();
    let frontend_url = state.config.frontend_url.clone();
    let ttl = state.config.reset_ttl;

    tokio::spawn(async move {
        let user = match db::users::find_by_email(&pool, &email).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Password reset lookup failed: {e}");
                return;
            }
        };

        let raw = token::generate();
        if let Err(e) = db::password_resets::replace_for_user(
            &pool,
            user.id,
            &token::hash(&raw),
            Utc::now() + ttl,
        )
        .await
        {
            tracing::error!("Failed to store password reset for user {}: {e}", user.id);
            return;
        }

        let reset_url = format!("{frontend_url}/auth/reset-password?token={raw}");
        match mailer {
            Some(mailer) => {
                if let Err(e) = mailer
                    .send_password_reset(&user.email, &user.name, &reset_url, ttl.num_minutes())
                    .await
                {
                    tracing::error!("Failed to send password reset email: {e}");
                }
            }
            None => {
                tracing::warn!("System SMTP not configured. Password reset link: {reset_url}");
            }
        }
    });

    Ok(response)
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    password::check_length(&req.password).map_err(AppError::BadRequest)?;

    // Hash before consuming so a hashing failure does not burn the token
    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let mut tx = state.pool.begin().await?;

    let record = db::password_resets::consume_valid_by_hash(&mut *tx, &token::hash(&req.token))
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    db::users::update_password(&mut *tx, record.user_id, &pw_hash).await?;
    db::refresh_tokens::delete_all_for_user(&mut *tx, record.user_id).await?;

    tx.commit().await?;

    tracing::info!("Password reset for user {}", record.user_id);

    Ok(MessageResponse::new("Password reset successfully"))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    password::check_length(&req.new_password).map_err(AppError::BadRequest)?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let valid =
        password::verify(&req.current_password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    // Every other session ends with the old password
    db::refresh_tokens::delete_all_for_user(&state.pool, user.id).await?;

    let (jar, response) = start_session(&state, user, false).await?;
    Ok((jar, Json(response)))
}
