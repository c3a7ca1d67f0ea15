//! Request log (usage ledger) entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use tally_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// A row from the `request_logs` table (append-only).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RequestLog {
    pub id: DbId,
    pub user_id: DbId,
    pub api_token_id: Option<DbId>,
    pub billing_period_id: Option<DbId>,
    pub service: String,
    pub request_ts: Timestamp,
    pub duration_ms: i32,
    pub request_bytes: i32,
    pub response_bytes: i32,
    pub status: String,
    pub error_code: Option<String>,
    pub request_id: Uuid,
    pub result: Option<String>,
}

/// Listing projection with the token prefix resolved via LEFT JOIN.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RequestLogListItem {
    pub id: DbId,
    pub request_ts: Timestamp,
    pub service: String,
    pub status: String,
    pub error_code: Option<String>,
    pub duration_ms: i32,
    pub request_bytes: i32,
    pub response_bytes: i32,
    pub request_id: Uuid,
    pub token_prefix: Option<String>,
}

/// Insert DTO for a ledger entry.
#[derive(Debug, Clone)]
pub struct NewRequestLog {
    pub user_id: DbId,
    pub api_token_id: Option<DbId>,
    pub billing_period_id: DbId,
    pub service: String,
    pub request_ts: Timestamp,
    pub duration_ms: i32,
    pub request_bytes: i32,
    pub response_bytes: i32,
    pub status: String,
    pub error_code: Option<String>,
    pub request_id: Uuid,
    pub result: Option<String>,
}
