//! Shared harness for HTTP and service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tally_api::auth::jwt::{generate_access_token, JwtConfig};
use tally_api::config::{BillingConfig, ServerConfig};
use tally_api::router::build_app_router;
use tally_api::state::AppState;
use tally_core::api_tokens::generate_token;
use tally_core::clock::FixedClock;
use tally_core::hashing::hash_secret;
use tally_core::types::Timestamp;
use tally_db::models::api_token::ApiToken;
use tally_db::models::user::{CreateUser, User};
use tally_db::repositories::{ApiTokenRepo, UserRepo};
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "test_password_123!";

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
        billing: BillingConfig::default(),
    }
}

/// Mid-August 2025, noon UTC.
pub fn default_now() -> Timestamp {
    at(2025, 8, 15)
}

pub fn at(y: i32, m: u32, d: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub fn test_state(pool: PgPool, clock: Arc<FixedClock>) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        clock,
    }
}

/// Build the full application router with a clock pinned to [`default_now`].
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_clock(pool, Arc::new(FixedClock::new(default_now())))
}

/// Build the full application router with the given clock.
///
/// Uses the same `build_app_router` as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app_with_clock(pool: PgPool, clock: Arc<FixedClock>) -> Router {
    let config = test_config();
    build_app_router(test_state(pool, clock), &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user directly. Verified users get `email_verified_at` set.
pub async fn create_user(pool: &PgPool, email: &str, verified: bool, is_staff: bool) -> User {
    let mut conn = pool.acquire().await.unwrap();
    let input = CreateUser {
        email: email.to_string(),
        password_hash: hash_secret(TEST_PASSWORD).unwrap(),
        is_staff,
    };
    let user = UserRepo::create(&mut conn, &input).await.unwrap();
    if verified {
        UserRepo::mark_email_verified(pool, user.id, default_now())
            .await
            .unwrap()
            .unwrap()
    } else {
        user
    }
}

/// Insert a token for `user` and return the row plus its plaintext.
pub async fn create_token(pool: &PgPool, user: &User, name: &str) -> (ApiToken, String) {
    let generated = generate_token().unwrap();
    let token = ApiTokenRepo::create(
        pool,
        user.id,
        name,
        &generated.prefix,
        &generated.hash,
        default_now(),
    )
    .await
    .unwrap();
    (token, generated.plaintext)
}

/// A session JWT for `user`, signed with the test secret.
pub fn session_token(user: &User) -> String {
    generate_access_token(user.id, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn builder(method: &str, uri: &str, bearer: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, builder("GET", uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, bearer: &str) -> Response<Body> {
    send(app, builder("GET", uri, Some(bearer)).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = builder("POST", uri, None)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    bearer: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = builder("POST", uri, Some(bearer))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_raw_auth(app: Router, uri: &str, bearer: &str, body: &str) -> Response<Body> {
    let request = builder("POST", uri, Some(bearer))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, bearer: &str) -> Response<Body> {
    send(app, builder("POST", uri, Some(bearer)).body(Body::empty()).unwrap()).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    bearer: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = builder("PUT", uri, Some(bearer))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, bearer: &str) -> Response<Body> {
    send(app, builder("DELETE", uri, Some(bearer)).body(Body::empty()).unwrap()).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
