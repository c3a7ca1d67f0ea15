//! Page-number pagination helpers for the read-only reporting views.

/// Rows per page on every paginated listing.
pub const PAGE_SIZE: i64 = 25;

/// Clamp a user-provided limit to `[1, max]`, defaulting when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// A resolved 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    /// Resolve `?page=` (1-based; missing or < 1 means the first page).
    pub fn new(number: Option<i64>) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            size: PAGE_SIZE,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }

    /// The next page number, if rows remain after this page.
    pub fn next(&self, total: i64) -> Option<i64> {
        let end = self.offset().saturating_add(self.size);
        (end < total).then(|| self.number.saturating_add(1))
    }

    pub fn previous(&self) -> Option<i64> {
        (self.number > 1).then_some(self.number - 1)
    }
}
