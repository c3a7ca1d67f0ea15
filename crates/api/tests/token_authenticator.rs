//! Integration tests for `TokenAuthenticator`.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use sqlx::PgPool;
use tally_api::error::AppError;
use tally_api::services::token_auth::TokenAuthenticator;
use tally_core::clock::FixedClock;
use tally_core::error::{AuthFailure, CoreError};
use tally_db::repositories::{ApiTokenRepo, UserRepo};

use common::{at, create_token, create_user, default_now};

fn failure(result: Result<impl std::fmt::Debug, AppError>) -> AuthFailure {
    match result {
        Err(AppError::Core(CoreError::Auth(kind))) => kind,
        other => panic!("expected an authentication failure, got {other:?}"),
    }
}

/// Flip one character of the secret part while keeping the prefix intact.
fn tamper(plaintext: &str) -> String {
    let mut chars: Vec<char> = plaintext.chars().collect();
    let last = chars.len() - 1;
    chars[last] = if chars[last] == 'a' { 'b' } else { 'a' };
    chars.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn valid_token_authenticates_and_touches(pool: PgPool) {
    let user = create_user(&pool, "ok@example.com", true, false).await;
    let (token, plaintext) = create_token(&pool, &user, "demo").await;

    let clock = FixedClock::new(at(2025, 8, 20));
    let auth = TokenAuthenticator::new(&pool, &clock);

    let authenticated = auth.authenticate(&plaintext).await.unwrap();
    assert_eq!(authenticated.user.id, user.id);
    assert_eq!(authenticated.token.id, token.id);

    let stored = ApiTokenRepo::find_for_user(&pool, token.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.last_used_at, Some(at(2025, 8, 20)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_touch_still_authenticates(pool: PgPool) {
    let user = create_user(&pool, "stuck@example.com", true, false).await;
    let (token, plaintext) = create_token(&pool, &user, "demo").await;

    // Every write to api_tokens now fails.
    sqlx::raw_sql(
        "CREATE FUNCTION reject_token_update() RETURNS TRIGGER AS $$
         BEGIN RAISE EXCEPTION 'api_tokens is read-only'; END;
         $$ LANGUAGE plpgsql;
         CREATE TRIGGER trg_api_tokens_read_only BEFORE UPDATE ON api_tokens
             FOR EACH ROW EXECUTE FUNCTION reject_token_update();",
    )
    .execute(&pool)
    .await
    .unwrap();

    let clock = FixedClock::new(at(2025, 8, 20));
    let auth = TokenAuthenticator::new(&pool, &clock);

    let authenticated = auth.authenticate(&plaintext).await.unwrap();
    assert_eq!(authenticated.user.id, user.id);
    assert_eq!(authenticated.token.id, token.id);

    let stored = ApiTokenRepo::find_for_user(&pool, token.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.last_used_at, None);
}

// ---------------------------------------------------------------------------
// Failure kinds
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_tokens_are_rejected(pool: PgPool) {
    let clock = FixedClock::new(default_now());
    let auth = TokenAuthenticator::new(&pool, &clock);

    for bearer in ["", "tok_short", "nope_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"] {
        assert_eq!(failure(auth.authenticate(bearer).await), AuthFailure::MalformedToken);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_prefix_is_not_found(pool: PgPool) {
    let clock = FixedClock::new(default_now());
    let auth = TokenAuthenticator::new(&pool, &clock);
    let bearer = format!("tok_{}", "Z".repeat(43));

    assert_eq!(failure(auth.authenticate(&bearer).await), AuthFailure::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoked_token_is_revoked_regardless_of_secret(pool: PgPool) {
    let user = create_user(&pool, "rev@example.com", true, false).await;
    let (token, plaintext) = create_token(&pool, &user, "demo").await;
    ApiTokenRepo::revoke(&pool, token.id, user.id, default_now())
        .await
        .unwrap();

    let clock = FixedClock::new(default_now());
    let auth = TokenAuthenticator::new(&pool, &clock);

    assert_eq!(failure(auth.authenticate(&plaintext).await), AuthFailure::Revoked);
    assert_eq!(
        failure(auth.authenticate(&tamper(&plaintext)).await),
        AuthFailure::Revoked
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_owner_is_rejected(pool: PgPool) {
    let user = create_user(&pool, "gone@example.com", true, false).await;
    let (_token, plaintext) = create_token(&pool, &user, "demo").await;
    UserRepo::deactivate(&pool, user.id).await.unwrap();

    let clock = FixedClock::new(default_now());
    let auth = TokenAuthenticator::new(&pool, &clock);
    assert_eq!(failure(auth.authenticate(&plaintext).await), AuthFailure::UserInactive);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unverified_owner_is_rejected(pool: PgPool) {
    let user = create_user(&pool, "new@example.com", false, false).await;
    let (_token, plaintext) = create_token(&pool, &user, "demo").await;

    let clock = FixedClock::new(default_now());
    let auth = TokenAuthenticator::new(&pool, &clock);
    assert_eq!(
        failure(auth.authenticate(&plaintext).await),
        AuthFailure::EmailUnverified
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_secret_with_valid_prefix_is_bad_secret(pool: PgPool) {
    let user = create_user(&pool, "bad@example.com", true, false).await;
    let (token, plaintext) = create_token(&pool, &user, "demo").await;

    let clock = FixedClock::new(default_now());
    let auth = TokenAuthenticator::new(&pool, &clock);
    assert_eq!(
        failure(auth.authenticate(&tamper(&plaintext)).await),
        AuthFailure::BadSecret
    );

    // A failed attempt does not count as use.
    let stored = ApiTokenRepo::find_for_user(&pool, token.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.last_used_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_revoke_authenticate_scenario(pool: PgPool) {
    let user = create_user(&pool, "u@example.com", true, false).await;
    let (token, plaintext) = create_token(&pool, &user, "demo").await;

    let clock = Arc::new(FixedClock::new(default_now()));
    let auth = TokenAuthenticator::new(&pool, clock.as_ref());
    assert!(auth.authenticate(&plaintext).await.is_ok());

    ApiTokenRepo::revoke(&pool, token.id, user.id, default_now())
        .await
        .unwrap();

    assert_matches!(
        auth.authenticate(&plaintext).await,
        Err(AppError::Core(CoreError::Auth(AuthFailure::Revoked)))
    );
}
