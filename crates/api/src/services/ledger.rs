//! The usage ledger.
//!
//! Recording a request appends one `request_logs` row attached to the
//! user's current billing period and, for successful requests, bumps that
//! period's counters. Both writes share a transaction: either the entry and
//! its charge both exist or neither does.

use std::time::Duration;

use sqlx::PgPool;
use tally_core::clock::Clock;
use tally_core::types::DbId;
use tally_core::usage::{clamp_to_i32, validate_entry_labels, RequestOutcome};
use tally_db::models::request_log::{NewRequestLog, RequestLog};
use tally_db::repositories::{RequestLogRepo, SettingsRepo};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::billing::BillingAccountant;

/// One metered request, as observed by the handler that served it.
#[derive(Debug, Clone)]
pub struct UsageRecord {
    pub user_id: DbId,
    pub api_token_id: Option<DbId>,
    pub service: String,
    pub duration: Duration,
    pub request_bytes: u64,
    pub response_bytes: u64,
    pub outcome: RequestOutcome,
    pub error_code: Option<String>,
    /// Correlation id, normally the `x-request-id` header.
    pub request_id: Uuid,
    pub result: Option<String>,
}

pub struct UsageLedger<'a> {
    pool: &'a PgPool,
    clock: &'a dyn Clock,
}

impl<'a> UsageLedger<'a> {
    pub fn new(pool: &'a PgPool, clock: &'a dyn Clock) -> Self {
        Self { pool, clock }
    }

    /// Append `record` to the ledger and charge the current period.
    pub async fn record(&self, record: UsageRecord) -> AppResult<RequestLog> {
        validate_entry_labels(&record.service, record.error_code.as_deref())?;

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let period = BillingAccountant::current_period_in(&mut tx, record.user_id, now).await?;

        let entry = NewRequestLog {
            user_id: record.user_id,
            api_token_id: record.api_token_id,
            billing_period_id: period.id,
            service: record.service,
            request_ts: now,
            duration_ms: clamp_to_i32(u64::try_from(record.duration.as_millis()).unwrap_or(u64::MAX)),
            request_bytes: clamp_to_i32(record.request_bytes),
            response_bytes: clamp_to_i32(record.response_bytes),
            status: record.outcome.as_str().to_string(),
            error_code: record.error_code,
            request_id: record.request_id,
            result: record.result,
        };
        let logged = RequestLogRepo::insert(&mut tx, &entry).await?;

        if record.outcome.is_billable() {
            let price = SettingsRepo::get(&mut tx).await?.cost_per_request_cents;
            BillingAccountant::increment(&mut tx, period.id, 1, price).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            user_id = logged.user_id,
            request_log_id = logged.id,
            billing_period_id = period.id,
            service = %logged.service,
            status = %logged.status,
            request_id = %logged.request_id,
            "Usage recorded",
        );
        Ok(logged)
    }
}
