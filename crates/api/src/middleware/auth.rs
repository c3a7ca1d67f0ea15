//! Bearer authentication extractor for Axum handlers.
//!
//! `Authorization: Bearer <credential>` carries either a session JWT issued
//! by `/auth/login` or an API token. API tokens are recognised by their
//! `tok_` marker and go through the [`TokenAuthenticator`]; anything else is
//! treated as a JWT.
//!
//! [`TokenAuthenticator`]: crate::services::token_auth::TokenAuthenticator

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tally_core::api_tokens::looks_like_api_token;
use tally_core::error::CoreError;
use tally_core::permissions::{AuthMethod, Principal};
use tally_db::models::user::User;
use tally_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.principal.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
}

impl AuthUser {
    pub fn user_id(&self) -> tally_core::types::DbId {
        self.principal.user_id
    }

    fn from_user(user: &User, method: AuthMethod) -> Self {
        Self {
            principal: Principal {
                user_id: user.id,
                is_active: user.is_active,
                is_staff: user.is_staff,
                email_verified: user.is_email_verified(),
                method,
            },
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let credential = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        if looks_like_api_token(credential) {
            let authenticated = state.authenticator().authenticate(credential).await?;
            return Ok(AuthUser::from_user(
                &authenticated.user,
                AuthMethod::ApiToken {
                    token_id: authenticated.token.id,
                },
            ));
        }

        let claims = validate_token(credential, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired session".into()))
        })?;

        let user = UserRepo::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("User no longer exists".into()))
            })?;

        Ok(AuthUser::from_user(&user, AuthMethod::Session))
    }
}
