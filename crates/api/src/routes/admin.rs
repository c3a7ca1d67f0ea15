//! Route definitions for the `/admin` resource (staff only).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST /users/{id}/verify-email            -> verify_email
/// POST /users/{id}/deactivate              -> deactivate_user
/// GET  /invite-codes                       -> list_invite_codes
/// POST /invite-codes                       -> create_invite_code
/// GET  /settings                           -> get_settings
/// PUT  /settings                           -> update_settings
/// POST /billing/periods/{id}/mark-paid     -> mark_paid
/// POST /billing/periods/{id}/mark-overdue  -> mark_overdue
/// POST /billing/periods/{id}/waive         -> waive
/// POST /billing/mark-overdue               -> run_mark_overdue
/// POST /billing/rollover                   -> run_rollover
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/verify-email", post(admin::verify_email))
        .route("/users/{id}/deactivate", post(admin::deactivate_user))
        .route(
            "/invite-codes",
            get(admin::list_invite_codes).post(admin::create_invite_code),
        )
        .route(
            "/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .route("/billing/periods/{id}/mark-paid", post(admin::mark_paid))
        .route("/billing/periods/{id}/mark-overdue", post(admin::mark_overdue))
        .route("/billing/periods/{id}/waive", post(admin::waive))
        .route("/billing/mark-overdue", post(admin::run_mark_overdue))
        .route("/billing/rollover", post(admin::run_rollover))
}
