//! Metered service endpoints.
//!
//! Every call, successful or not, is written to the usage ledger before the
//! response leaves. If the ledger write fails the caller gets a 500 rather
//! than an unbilled success.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tally_core::usage::{RequestOutcome, SERVICE_ECHO};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::permissions::RequireApiToken;
use crate::router::REQUEST_ID_HEADER;
use crate::services::ledger::UsageRecord;
use crate::state::AppState;

/// Correlation id from the request header, or a fresh one if it is absent
/// or not a UUID.
fn request_id(headers: &HeaderMap) -> Uuid {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::new_v4)
}

/// POST /api/v1/services/echo
///
/// Echo the JSON request body back. API token authentication only.
pub async fn echo(
    RequireApiToken(auth): RequireApiToken,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let started = Instant::now();
    let request_id = request_id(&headers);

    let parsed = serde_json::from_slice::<serde_json::Value>(&body);
    let (status, outcome, error_code, payload) = match parsed {
        Ok(value) => (
            StatusCode::OK,
            RequestOutcome::Success,
            None,
            json!({ "data": { "echo": value, "request_id": request_id } }),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            RequestOutcome::Error,
            Some("invalid_json".to_string()),
            json!({
                "error": format!("Request body is not valid JSON: {e}"),
                "code": "BAD_REQUEST",
            }),
        ),
    };

    let response_body = serde_json::to_vec(&payload)
        .map_err(|e| AppError::InternalError(format!("Serialization error: {e}")))?;

    state
        .ledger()
        .record(UsageRecord {
            user_id: auth.user_id(),
            api_token_id: auth.principal.token_id(),
            service: SERVICE_ECHO.to_string(),
            duration: started.elapsed(),
            request_bytes: body.len() as u64,
            response_bytes: response_body.len() as u64,
            outcome,
            error_code,
            request_id,
            result: None,
        })
        .await?;

    Ok((
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        response_body,
    )
        .into_response())
}
