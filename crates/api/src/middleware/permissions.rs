//! Permission extractors.
//!
//! Each extractor wraps [`AuthUser`] and checks a fixed list of predicate
//! rules from [`tally_core::permissions`]. The first failing rule becomes a
//! 403 carrying that rule's message.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tally_core::permissions::{require, Rule, ACTIVE, EMAIL_VERIFIED, STAFF, TOKEN_AUTHENTICATED};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    rules: &[Rule],
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    require(&user.principal, rules)?;
    Ok(user)
}

/// Any active account, verified or not.
pub struct RequireActive(pub AuthUser);

impl FromRequestParts<AppState> for RequireActive {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, &[ACTIVE]).await.map(RequireActive)
    }
}

/// Active with a verified email address.
///
/// ```ignore
/// async fn list_tokens(RequireVerified(user): RequireVerified) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireVerified(pub AuthUser);

impl FromRequestParts<AppState> for RequireVerified {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, &[ACTIVE, EMAIL_VERIFIED])
            .await
            .map(RequireVerified)
    }
}

/// Verified and presenting an API token (session JWTs are rejected).
pub struct RequireApiToken(pub AuthUser);

impl FromRequestParts<AppState> for RequireApiToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, &[ACTIVE, EMAIL_VERIFIED, TOKEN_AUTHENTICATED])
            .await
            .map(RequireApiToken)
    }
}

/// Active staff account.
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, &[ACTIVE, STAFF]).await.map(RequireStaff)
    }
}
