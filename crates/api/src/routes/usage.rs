//! Route definitions for the `/usage` reports.

use axum::routing::get;
use axum::Router;

use crate::handlers::usage;
use crate::state::AppState;

/// Routes mounted at `/usage`.
///
/// ```text
/// GET /requests  -> list_requests
/// GET /summary   -> summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", get(usage::list_requests))
        .route("/summary", get(usage::summary))
}
