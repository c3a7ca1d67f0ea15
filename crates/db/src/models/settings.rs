//! Singleton runtime settings.

use serde::Serialize;
use sqlx::FromRow;
use tally_core::types::Timestamp;

/// The single row of the `settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Settings {
    pub id: i16,
    pub cost_per_request_cents: i64,
    pub updated_at: Timestamp,
}
