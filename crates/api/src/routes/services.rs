//! Route definitions for metered services.

use axum::routing::post;
use axum::Router;

use crate::handlers::services;
use crate::state::AppState;

/// Routes mounted at `/services`.
pub fn router() -> Router<AppState> {
    Router::new().route("/echo", post(services::echo))
}
