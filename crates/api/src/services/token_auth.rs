//! Bearer API token authentication.
//!
//! Two-phase lookup: an indexed equality match on the stored prefix narrows
//! the candidates to at most one row, and only then is the expensive Argon2
//! verification run against that single hash.

use std::sync::LazyLock;

use sqlx::PgPool;
use tally_core::api_tokens::{parse_bearer, verify_token};
use tally_core::clock::Clock;
use tally_core::error::{AuthFailure, CoreError};
use tally_core::hashing::hash_secret;
use tally_db::models::api_token::ApiToken;
use tally_db::models::user::User;
use tally_db::repositories::{ApiTokenRepo, UserRepo};

use crate::error::{AppError, AppResult};

/// Verified against on rejections that happen before the real Argon2 check,
/// so an unknown prefix costs as much as a wrong secret.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_secret("tok_decoy").ok());

/// A successfully authenticated bearer token and its owner.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub token: ApiToken,
}

pub struct TokenAuthenticator<'a> {
    pool: &'a PgPool,
    clock: &'a dyn Clock,
}

impl<'a> TokenAuthenticator<'a> {
    pub fn new(pool: &'a PgPool, clock: &'a dyn Clock) -> Self {
        Self { pool, clock }
    }

    /// Resolve a raw bearer string to its user and token.
    ///
    /// Failures come back as `CoreError::Auth` with the specific
    /// [`AuthFailure`]; the kind is logged here and collapsed to a plain 401
    /// by the error layer.
    pub async fn authenticate(&self, bearer: &str) -> AppResult<Authenticated> {
        match self.resolve(bearer).await {
            Ok(authenticated) => {
                self.touch(&authenticated.token).await;
                Ok(authenticated)
            }
            Err(AppError::Core(CoreError::Auth(kind))) => {
                if matches!(
                    kind,
                    AuthFailure::NotFound
                        | AuthFailure::Revoked
                        | AuthFailure::UserInactive
                        | AuthFailure::EmailUnverified
                ) {
                    decoy_verify(bearer).await;
                }
                let prefix = parse_bearer(bearer).unwrap_or("");
                tracing::warn!(
                    failure = kind.as_str(),
                    token_prefix = %prefix,
                    "API token authentication failed",
                );
                Err(AppError::Core(CoreError::Auth(kind)))
            }
            Err(other) => Err(other),
        }
    }

    async fn resolve(&self, bearer: &str) -> AppResult<Authenticated> {
        // 1. Shape check, no database access.
        let prefix = parse_bearer(bearer).map_err(CoreError::Auth)?;

        // 2-3. Indexed prefix lookup.
        let token = ApiTokenRepo::find_by_prefix(self.pool, prefix)
            .await?
            .ok_or(CoreError::Auth(AuthFailure::NotFound))?;

        // 4. Revocation wins over everything else, including a bad secret.
        if token.is_revoked() {
            return Err(CoreError::Auth(AuthFailure::Revoked).into());
        }

        // 5. Owner must be active and verified.
        let user = UserRepo::find_by_id(self.pool, token.user_id)
            .await?
            .ok_or(CoreError::Auth(AuthFailure::NotFound))?;
        if !user.is_active {
            return Err(CoreError::Auth(AuthFailure::UserInactive).into());
        }
        if !user.is_email_verified() {
            return Err(CoreError::Auth(AuthFailure::EmailUnverified).into());
        }

        // 6. Argon2 verification off the async executor; no locks are held.
        let plaintext = bearer.to_owned();
        let hash = token.token_hash.clone();
        tokio::task::spawn_blocking(move || verify_token(&plaintext, &hash))
            .await
            .map_err(AppError::blocking)?
            .map_err(CoreError::Auth)?;

        Ok(Authenticated { user, token })
    }

    /// Record the use. A failure here never fails the request.
    async fn touch(&self, token: &ApiToken) {
        if let Err(e) = ApiTokenRepo::touch_last_used(self.pool, token.id, self.clock.now()).await
        {
            tracing::warn!(
                error = %e,
                api_token_id = token.id,
                "Failed to update token last_used_at",
            );
        }
    }
}

/// Burn one Argon2 verification against [`DECOY_HASH`]; the outcome is ignored.
async fn decoy_verify(bearer: &str) {
    let plaintext = bearer.to_owned();
    let _ = tokio::task::spawn_blocking(move || {
        if let Some(hash) = DECOY_HASH.as_deref() {
            let _ = verify_token(&plaintext, hash);
        }
    })
    .await;
}
