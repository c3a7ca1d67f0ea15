//! Staff-only handlers: account administration, invite codes, pricing, and
//! billing period payment status.
//!
//! All endpoints require [`RequireStaff`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tally_core::billing::{PaymentMetadata, PaymentStatus};
use tally_core::error::CoreError;
use tally_core::invite_codes::generate_code;
use tally_core::pagination::{clamp_limit, clamp_offset};
use tally_core::types::DbId;
use tally_db::models::user::UserResponse;
use tally_db::repositories::{InviteCodeRepo, SettingsRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::billing::BillingPeriodView;
use crate::middleware::permissions::RequireStaff;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_INVITE_PAGE: i64 = 50;
const MAX_INVITE_PAGE: i64 = 200;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CreateInviteCodeRequest {
    /// Lifetime in days; omitted means the code never expires.
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub cost_per_request_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct MarkOverdueParams {
    pub after_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MarkOverdueResponse {
    pub marked: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct RolloverResponse {
    pub users_processed: usize,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/users/{id}/verify-email
///
/// Idempotent: an existing verification time is kept.
pub async fn verify_email(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::mark_email_verified(&state.pool, user_id, state.clock.now())
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?;

    tracing::info!(user_id, admin_id = admin.user_id(), "Email marked verified");
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// POST /api/v1/admin/users/{id}/deactivate
///
/// Existing tokens stop authenticating immediately (`UserInactive`).
pub async fn deactivate_user(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<StatusCode> {
    if user_id == admin.user_id() {
        return Err(AppError::BadRequest(
            "Staff cannot deactivate their own account".into(),
        ));
    }
    if UserRepo::find_by_id(&state.pool, user_id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }
        .into());
    }
    if UserRepo::deactivate(&state.pool, user_id).await? {
        tracing::info!(user_id, admin_id = admin.user_id(), "User deactivated");
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Invite codes
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/invite-codes
pub async fn create_invite_code(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    body: Option<Json<CreateInviteCodeRequest>>,
) -> AppResult<impl IntoResponse> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let expires_at = match input.expires_in_days {
        Some(days) if days <= 0 => {
            return Err(CoreError::Validation("expires_in_days must be positive".into()).into());
        }
        Some(days) => Some(
            TimeDelta::try_days(days)
                .and_then(|delta| state.clock.now().checked_add_signed(delta))
                .ok_or_else(|| CoreError::Validation("expires_in_days is too large".into()))?,
        ),
        None => None,
    };

    let invite = InviteCodeRepo::create(&state.pool, &generate_code(), expires_at).await?;
    tracing::info!(invite_code_id = invite.id, admin_id = admin.user_id(), "Invite code created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: invite })))
}

/// GET /api/v1/admin/invite-codes?limit=&offset=
pub async fn list_invite_codes(
    _admin: RequireStaff,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_INVITE_PAGE, MAX_INVITE_PAGE);
    let offset = clamp_offset(params.offset);
    let codes = InviteCodeRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: codes }))
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/settings
pub async fn get_settings(
    _admin: RequireStaff,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let settings = SettingsRepo::get(&mut conn).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/admin/settings
///
/// Changes the price charged for subsequent requests; closed and current
/// period totals are not restated.
pub async fn update_settings(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<UpdateSettingsRequest>,
) -> AppResult<impl IntoResponse> {
    if input.cost_per_request_cents < 0 {
        return Err(CoreError::Validation(
            "cost_per_request_cents must not be negative".into(),
        )
        .into());
    }
    let settings = SettingsRepo::set_cost_per_request(&state.pool, input.cost_per_request_cents).await?;
    tracing::info!(
        cost_per_request_cents = settings.cost_per_request_cents,
        admin_id = admin.user_id(),
        "Pricing updated",
    );
    Ok(Json(DataResponse { data: settings }))
}

// ---------------------------------------------------------------------------
// Billing periods
// ---------------------------------------------------------------------------

async fn transition(
    state: &AppState,
    admin_id: DbId,
    period_id: DbId,
    to: PaymentStatus,
    metadata: PaymentMetadata,
) -> AppResult<Json<DataResponse<BillingPeriodView>>> {
    let period = state.accountant().transition(period_id, to, metadata).await?;
    tracing::info!(billing_period_id = period_id, admin_id, to = %to, "Payment status set by staff");
    Ok(Json(DataResponse {
        data: period.into(),
    }))
}

/// POST /api/v1/admin/billing/periods/{id}/mark-paid
///
/// Body `{ amount_cents?, reference?, notes? }`; the amount defaults to the
/// period's total cost.
pub async fn mark_paid(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
    body: Option<Json<PaymentMetadata>>,
) -> AppResult<impl IntoResponse> {
    let metadata = body.map(|Json(m)| m).unwrap_or_default();
    transition(&state, admin.user_id(), period_id, PaymentStatus::Paid, metadata).await
}

/// POST /api/v1/admin/billing/periods/{id}/mark-overdue
pub async fn mark_overdue(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
    body: Option<Json<PaymentMetadata>>,
) -> AppResult<impl IntoResponse> {
    let metadata = body.map(|Json(m)| m).unwrap_or_default();
    transition(&state, admin.user_id(), period_id, PaymentStatus::Overdue, metadata).await
}

/// POST /api/v1/admin/billing/periods/{id}/waive
pub async fn waive(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
    body: Option<Json<PaymentMetadata>>,
) -> AppResult<impl IntoResponse> {
    let metadata = body.map(|Json(m)| m).unwrap_or_default();
    transition(&state, admin.user_id(), period_id, PaymentStatus::Waived, metadata).await
}

/// POST /api/v1/admin/billing/mark-overdue?after_days=
///
/// Runs the overdue sweep immediately instead of waiting for the background job.
pub async fn run_mark_overdue(
    _admin: RequireStaff,
    State(state): State<AppState>,
    Query(params): Query<MarkOverdueParams>,
) -> AppResult<impl IntoResponse> {
    let after_days = params
        .after_days
        .unwrap_or(state.config.billing.overdue_after_days);
    if after_days < 0 {
        return Err(CoreError::Validation("after_days must not be negative".into()).into());
    }
    let marked = state.accountant().mark_overdue(after_days).await?;
    Ok(Json(DataResponse {
        data: MarkOverdueResponse { marked },
    }))
}

/// POST /api/v1/admin/billing/rollover
///
/// Ensures every active user has a current period for this month.
pub async fn run_rollover(
    _admin: RequireStaff,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let users_processed = state.accountant().ensure_current_periods().await?;
    Ok(Json(DataResponse {
        data: RolloverResponse { users_processed },
    }))
}
