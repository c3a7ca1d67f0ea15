//! HTTP-level tests for registration, login, and the session endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, get, get_auth, post_json, post_json_auth, session_token,
    TEST_PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;
use tally_db::repositories::{InviteCodeRepo, UserRepo};

async fn login(app: axum::Router, email: &str, password: &str) -> axum::response::Response {
    post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_with_invite_creates_unverified_user(pool: PgPool) {
    InviteCodeRepo::create(&pool, "WELCOME1", None).await.unwrap();
    let app = common::build_test_app(pool.clone());

    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({ "email": "new@example.com", "password": "long-enough-pw", "invite_code": "welcome1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "new@example.com");
    assert_eq!(json["data"]["is_email_verified"], false);
    assert!(json["data"].get("password_hash").is_none());

    let invite = InviteCodeRepo::find_by_code(&pool, "WELCOME1").await.unwrap().unwrap();
    assert!(invite.used_at.is_some());
    assert_eq!(invite.used_by, json["data"]["id"].as_i64());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invite_codes_are_single_use(pool: PgPool) {
    InviteCodeRepo::create(&pool, "ONCEONLY", None).await.unwrap();

    let first = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/register",
        json!({ "email": "one@example.com", "password": "long-enough-pw", "invite_code": "ONCEONLY" }),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/register",
        json!({ "email": "two@example.com", "password": "long-enough-pw", "invite_code": "ONCEONLY" }),
    )
    .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert!(UserRepo::find_by_email(&pool, "two@example.com").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_invite_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({ "email": "x@example.com", "password": "long-enough-pw", "invite_code": "NOPE1234" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_email_conflicts(pool: PgPool) {
    create_user(&pool, "taken@example.com", true, false).await;
    InviteCodeRepo::create(&pool, "SECOND01", None).await.unwrap();
    let app = common::build_test_app(pool.clone());

    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({ "email": "Taken@Example.com", "password": "long-enough-pw", "invite_code": "SECOND01" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The code is still available.
    let invite = InviteCodeRepo::find_by_code(&pool, "SECOND01").await.unwrap().unwrap();
    assert!(invite.used_at.is_none());
}

// ---------------------------------------------------------------------------
// Login and session endpoints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_bearer_session(pool: PgPool) {
    let user = create_user(&pool, "login@example.com", true, false).await;
    let app = common::build_test_app(pool);

    let response = login(app.clone(), "login@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], 3600);
    assert_eq!(json["user"]["id"], user.id);

    let token = json["access_token"].as_str().unwrap();
    let me = get_auth(app, "/api/v1/auth/me", token).await;
    assert_eq!(me.status(), StatusCode::OK);
    let me = body_json(me).await;
    assert_eq!(me["data"]["email"], "login@example.com");
    assert_eq!(me["data"]["auth_method"], "session");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_with_wrong_password_is_401(pool: PgPool) {
    create_user(&pool, "wrong@example.com", true, false).await;
    let app = common::build_test_app(pool);

    let response = login(app.clone(), "wrong@example.com", "not-the-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(app, "nobody@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivated_user_cannot_log_in(pool: PgPool) {
    let user = create_user(&pool, "gone@example.com", true, false).await;
    UserRepo::deactivate(&pool, user.id).await.unwrap();
    let app = common::build_test_app(pool);

    let response = login(app, "gone@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_requires_credentials(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.clone(), "/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Bearer realm=\"api\""
    );

    let response = get_auth(app, "/api/v1/auth/me", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn change_password_rotates_login(pool: PgPool) {
    let user = create_user(&pool, "rotate@example.com", true, false).await;
    let app = common::build_test_app(pool);
    let session = session_token(&user);

    let wrong = post_json_auth(
        app.clone(),
        "/api/v1/auth/change-password",
        &session,
        json!({ "current_password": "nope-nope", "new_password": "brand-new-password" }),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);

    let ok = post_json_auth(
        app.clone(),
        "/api/v1/auth/change-password",
        &session,
        json!({ "current_password": TEST_PASSWORD, "new_password": "brand-new-password" }),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::NO_CONTENT);

    let old = login(app.clone(), "rotate@example.com", TEST_PASSWORD).await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
    let new = login(app, "rotate@example.com", "brand-new-password").await;
    assert_eq!(new.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unverified_user_cannot_change_password(pool: PgPool) {
    let user = create_user(&pool, "pending@example.com", false, false).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/auth/change-password",
        &session_token(&user),
        json!({ "current_password": TEST_PASSWORD, "new_password": "brand-new-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
