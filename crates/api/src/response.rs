//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Paginated listings
//! put a [`PageResponse`] inside it.

use serde::Serialize;
use tally_core::pagination::Page;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// One page of a page-number paginated listing.
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    /// Total rows across all pages.
    pub count: i64,
    pub page: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T: Serialize> PageResponse<T> {
    pub fn new(page: Page, count: i64, results: Vec<T>) -> Self {
        Self {
            count,
            page: page.number,
            next: page.next(count),
            previous: page.previous(),
            results,
        }
    }
}
