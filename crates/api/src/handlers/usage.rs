//! Read-only usage reporting over the ledger.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tally_core::error::CoreError;
use tally_core::pagination::Page;
use tally_core::types::Timestamp;
use tally_core::usage::SummaryWindows;
use tally_db::repositories::RequestLogRepo;

use crate::error::AppResult;
use crate::middleware::permissions::RequireVerified;
use crate::query::UsageQuery;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

/// Request counts for the rolling windows on the dashboard.
#[derive(Debug, Serialize)]
pub struct UsageSummary {
    pub today: i64,
    pub yesterday: i64,
    pub last_7_days: i64,
    pub this_month: i64,
    pub last_request_at: Option<Timestamp>,
}

/// GET /api/v1/usage/requests?from=&to=&page=
pub async fn list_requests(
    RequireVerified(auth): RequireVerified,
    State(state): State<AppState>,
    Query(params): Query<UsageQuery>,
) -> AppResult<impl IntoResponse> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if from > to {
            return Err(CoreError::Validation("'from' must not be after 'to'".into()).into());
        }
    }

    let page = Page::new(params.page);
    let user_id = auth.user_id();

    let count = RequestLogRepo::count_for_user(&state.pool, user_id, params.from, params.to).await?;
    let rows = RequestLogRepo::list_for_user(
        &state.pool,
        user_id,
        params.from,
        params.to,
        page.size,
        page.offset(),
    )
    .await?;

    Ok(Json(DataResponse {
        data: PageResponse::new(page, count, rows),
    }))
}

/// GET /api/v1/usage/summary
pub async fn summary(
    RequireVerified(auth): RequireVerified,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let windows = SummaryWindows::at(state.clock.now());
    let pool = &state.pool;
    let user_id = auth.user_id();

    let today = RequestLogRepo::count_between(pool, user_id, windows.today, None).await?;
    let yesterday =
        RequestLogRepo::count_between(pool, user_id, windows.yesterday, Some(windows.today))
            .await?;
    let last_7_days = RequestLogRepo::count_between(pool, user_id, windows.week_ago, None).await?;
    let this_month = RequestLogRepo::count_between(pool, user_id, windows.month_start, None).await?;
    let last_request_at = RequestLogRepo::latest_ts(pool, user_id).await?;

    Ok(Json(DataResponse {
        data: UsageSummary {
            today,
            yesterday,
            last_7_days,
            this_month,
            last_request_at,
        },
    }))
}
