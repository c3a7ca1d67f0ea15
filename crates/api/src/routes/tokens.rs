//! Route definitions for the `/tokens` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::tokens;
use crate::state::AppState;

/// Routes mounted at `/tokens`.
///
/// ```text
/// GET    /       -> list_tokens
/// POST   /       -> create_token
/// DELETE /{id}   -> revoke_token
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tokens::list_tokens).post(tokens::create_token))
        .route("/{id}", delete(tokens::revoke_token))
}
