//! Shared query parameter types for API handlers.

use serde::Deserialize;
use tally_core::types::Timestamp;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped via `clamp_limit` / `clamp_offset` before use.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Page-number pagination (`?page=`), 1-based.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
}

/// Date-range filter plus page number for ledger listings.
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    /// Inclusive lower bound on `request_ts` (RFC 3339).
    pub from: Option<Timestamp>,
    /// Inclusive upper bound on `request_ts` (RFC 3339).
    pub to: Option<Timestamp>,
    pub page: Option<i64>,
}
