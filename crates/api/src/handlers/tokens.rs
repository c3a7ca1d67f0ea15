//! Handlers for the caller's own API tokens.
//!
//! The plaintext token is returned **only** on creation; listings expose the
//! prefix for identification and never the hash.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tally_core::api_tokens::{generate_token, validate_name};
use tally_core::error::CoreError;
use tally_core::types::DbId;
use tally_db::is_unique_violation;
use tally_db::models::api_token::{ApiTokenCreatedResponse, CreateApiToken};
use tally_db::repositories::ApiTokenRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::permissions::{RequireActive, RequireVerified};
use crate::response::DataResponse;
use crate::state::AppState;

/// Attempts at finding an unused prefix before giving up.
const MAX_PREFIX_ATTEMPTS: usize = 3;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/tokens
///
/// Mint a new token for the caller. The plaintext is returned exactly once.
pub async fn create_token(
    RequireVerified(auth): RequireVerified,
    State(state): State<AppState>,
    Json(input): Json<CreateApiToken>,
) -> AppResult<impl IntoResponse> {
    validate_name(&input.name).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let name = input.name.trim();

    for attempt in 1..=MAX_PREFIX_ATTEMPTS {
        let generated = tokio::task::spawn_blocking(generate_token)
            .await
            .map_err(AppError::blocking)?
            .map_err(|e| AppError::InternalError(format!("Token hashing error: {e}")))?;

        let created = ApiTokenRepo::create(
            &state.pool,
            auth.user_id(),
            name,
            &generated.prefix,
            &generated.hash,
            state.clock.now(),
        )
        .await;

        match created {
            Ok(token) => {
                tracing::info!(
                    api_token_id = token.id,
                    token_prefix = %token.token_prefix,
                    user_id = auth.user_id(),
                    "API token created",
                );
                let response = ApiTokenCreatedResponse {
                    id: token.id,
                    name: token.name,
                    token_prefix: token.token_prefix,
                    token: generated.plaintext,
                    created_at: token.created_at,
                };
                return Ok((StatusCode::CREATED, Json(DataResponse { data: response })));
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(attempt, "API token prefix collision; regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::InternalError(
        "Could not allocate a unique token prefix".into(),
    ))
}

/// GET /api/v1/tokens
///
/// List the caller's tokens, revoked ones included.
pub async fn list_tokens(
    RequireVerified(auth): RequireVerified,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let tokens = ApiTokenRepo::list_for_user(&state.pool, auth.user_id()).await?;
    Ok(Json(DataResponse { data: tokens }))
}

/// DELETE /api/v1/tokens/{id}
///
/// Revoke one of the caller's tokens. Revoking an already revoked token is a
/// no-op; the original revocation time is kept.
pub async fn revoke_token(
    RequireActive(auth): RequireActive,
    State(state): State<AppState>,
    Path(token_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "ApiToken",
            id: token_id,
        })
    };

    let token = ApiTokenRepo::find_for_user(&state.pool, token_id, auth.user_id())
        .await?
        .ok_or_else(not_found)?;

    if token.is_revoked() {
        return Ok(StatusCode::NO_CONTENT);
    }

    if ApiTokenRepo::revoke(&state.pool, token_id, auth.user_id(), state.clock.now())
        .await?
        .is_some()
    {
        tracing::info!(
            api_token_id = token_id,
            token_prefix = %token.token_prefix,
            user_id = auth.user_id(),
            "API token revoked",
        );
    }

    Ok(StatusCode::NO_CONTENT)
}
