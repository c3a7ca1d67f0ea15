pub mod admin;
pub mod auth;
pub mod billing;
pub mod health;
pub mod services;
pub mod tokens;
pub mod usage;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register with invite code (public)
/// /auth/login                                      session token (public)
/// /auth/me                                         current user (active)
/// /auth/change-password                            change password (verified)
///
/// /tokens                                          list, create (verified)
/// /tokens/{id}                                     revoke (DELETE, owner)
///
/// /services/echo                                   metered echo (API token only)
///
/// /usage/requests                                  paginated ledger (verified)
/// /usage/summary                                   rolling counts (verified)
///
/// /billing/periods                                 list, ?status= filter (verified)
/// /billing/periods/current                         get-or-create current period
/// /billing/periods/{id}                            detail with paginated requests
///
/// /admin/users/{id}/verify-email                   mark email verified (staff)
/// /admin/users/{id}/deactivate                     deactivate account (staff)
/// /admin/invite-codes                              list, create (staff)
/// /admin/settings                                  get, update pricing (staff)
/// /admin/billing/periods/{id}/mark-paid            transition to paid (staff)
/// /admin/billing/periods/{id}/mark-overdue         transition to overdue (staff)
/// /admin/billing/periods/{id}/waive                transition to waived (staff)
/// /admin/billing/mark-overdue                      run overdue sweep (staff)
/// /admin/billing/rollover                          ensure current periods (staff)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/tokens", tokens::router())
        .nest("/services", services::router())
        .nest("/usage", usage::router())
        .nest("/billing", billing::router())
        .nest("/admin", admin::router())
}
