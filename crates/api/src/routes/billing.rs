//! Route definitions for the caller's billing periods.

use axum::routing::get;
use axum::Router;

use crate::handlers::billing;
use crate::state::AppState;

/// Routes mounted at `/billing`.
///
/// ```text
/// GET /periods           -> list_periods
/// GET /periods/current   -> current_period
/// GET /periods/{id}      -> get_period
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/periods", get(billing::list_periods))
        .route("/periods/current", get(billing::current_period))
        .route("/periods/{id}", get(billing::get_period))
}
