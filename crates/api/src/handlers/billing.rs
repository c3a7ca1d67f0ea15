//! Read-only billing views for the caller's own periods.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tally_core::billing::PaymentStatus;
use tally_core::error::CoreError;
use tally_core::pagination::Page;
use tally_core::types::DbId;
use tally_db::models::billing_period::BillingPeriod;
use tally_db::models::request_log::RequestLogListItem;
use tally_db::repositories::{BillingPeriodRepo, RequestLogRepo};

use crate::error::AppResult;
use crate::middleware::permissions::RequireVerified;
use crate::query::PageParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PeriodListParams {
    pub status: Option<String>,
}

/// A billing period with its display label ("August 2025").
#[derive(Debug, Serialize)]
pub struct BillingPeriodView {
    #[serde(flatten)]
    pub period: BillingPeriod,
    pub label: String,
}

impl From<BillingPeriod> for BillingPeriodView {
    fn from(period: BillingPeriod) -> Self {
        let label = period.label();
        Self { period, label }
    }
}

#[derive(Debug, Serialize)]
pub struct BillingPeriodDetail {
    pub period: BillingPeriodView,
    pub requests: PageResponse<RequestLogListItem>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/billing/periods?status=
pub async fn list_periods(
    RequireVerified(auth): RequireVerified,
    State(state): State<AppState>,
    Query(params): Query<PeriodListParams>,
) -> AppResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<PaymentStatus>)
        .transpose()?;

    let periods = BillingPeriodRepo::list_for_user(&state.pool, auth.user_id(), status).await?;
    let views: Vec<BillingPeriodView> = periods.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse { data: views }))
}

/// GET /api/v1/billing/periods/current
///
/// Opens the current month's period if it does not exist yet.
pub async fn current_period(
    RequireVerified(auth): RequireVerified,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let period = state.accountant().current_period(auth.user_id()).await?;
    Ok(Json(DataResponse {
        data: BillingPeriodView::from(period),
    }))
}

/// GET /api/v1/billing/periods/{id}?page=
///
/// Another user's period is reported as not found.
pub async fn get_period(
    RequireVerified(auth): RequireVerified,
    State(state): State<AppState>,
    Path(period_id): Path<DbId>,
    Query(params): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    let period = BillingPeriodRepo::find_for_user(&state.pool, period_id, auth.user_id())
        .await?
        .ok_or(CoreError::NotFound {
            entity: "BillingPeriod",
            id: period_id,
        })?;

    let page = Page::new(params.page);
    let count = RequestLogRepo::count_for_period(&state.pool, period.id).await?;
    let rows =
        RequestLogRepo::list_for_period(&state.pool, period.id, page.size, page.offset()).await?;

    Ok(Json(DataResponse {
        data: BillingPeriodDetail {
            period: period.into(),
            requests: PageResponse::new(page, count, rows),
        },
    }))
}
