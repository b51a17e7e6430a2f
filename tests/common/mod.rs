#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use gympro_auth::auth::token;
use gympro_auth::config::Config;
use gympro_auth::db;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_with_refresh_cookie(&self, path: &str, refresh: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .header("cookie", format!("refresh_token={refresh}"))
            .send()
            .await
            .expect("cookie request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn signup(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/v1/auth/signup",
            &json!({ "email": email, "password": password, "name": "Test Member" }),
        )
        .await
    }

    pub async fn signin(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/v1/auth/signin",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Store a verification token we know the raw value of. Mail is not
    /// configured in tests, so the one issued at signup never leaves the
    /// server.
    pub async fn plant_verification(&self, user_id: Uuid, ttl: chrono::Duration) -> String {
        let raw = token::generate();
        db::email_verifications::replace_for_user(
            &self.pool,
            user_id,
            &token::hash(&raw),
            Utc::now() + ttl,
        )
        .await
        .expect("plant verification failed");
        raw
    }

    pub async fn plant_password_reset(&self, user_id: Uuid, ttl: chrono::Duration) -> String {
        let raw = token::generate();
        db::password_resets::replace_for_user(
            &self.pool,
            user_id,
            &token::hash(&raw),
            Utc::now() + ttl,
        )
        .await
        .expect("plant password reset failed");
        raw
    }

    pub async fn user_id(&self, email: &str) -> Uuid {
        db::users::find_by_email(&self.pool, email)
            .await
            .expect("user lookup failed")
            .expect("user missing")
            .id
    }

    /// Sign up and verify a member, returning the access token.
    pub async fn verified_member(&self, email: &str, password: &str) -> String {
        let (body, status) = self.signup(email, password).await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");

        let user_id = self.user_id(email).await;
        let raw = self.plant_verification(user_id, chrono::Duration::hours(1)).await;
        let (body, status) = self
            .post("/api/v1/auth/verify-email", &json!({ "token": raw }))
            .await;
        assert_eq!(status, StatusCode::OK, "verify failed: {body}");

        body["access_token"].as_str().unwrap().to_string()
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database. Returns `None` when
/// `DATABASE_URL` is not set so database tests are skipped.
pub async fn spawn_app() -> Option<TestApp> {
    let _ = dotenvy::dotenv();

    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let db_name = format!("gympro_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        frontend_url: "http://localhost:5173".to_string(),
        log_level: "warn".to_string(),
        verification_ttl: chrono::Duration::hours(24),
        reset_ttl: chrono::Duration::minutes(60),
        sweep_interval: Duration::from_secs(300),
        smtp: None,
    };

    let state = gympro_auth::build_state(pool.clone(), config);
    let app = gympro_auth::build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    Some(TestApp {
        addr,
        pool,
        client,
        db_name,
    })
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
