//! Billing period entity model.

use serde::Serialize;
use sqlx::FromRow;
use tally_core::billing::{period_label, PaymentStatus};
use tally_core::error::CoreError;
use tally_core::types::{Date, DbId, Timestamp};

/// A row from the `billing_periods` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BillingPeriod {
    pub id: DbId,
    pub user_id: DbId,
    pub period_start: Date,
    pub period_end: Date,
    pub total_requests: i64,
    pub total_cost_cents: i64,
    pub is_current: bool,
    pub payment_status: String,
    pub paid_at: Option<Timestamp>,
    pub paid_amount_cents: Option<i64>,
    pub payment_reference: Option<String>,
    pub payment_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BillingPeriod {
    /// Parsed payment status. The column is CHECK-constrained, so a parse
    /// failure means the schema and code disagree.
    pub fn status(&self) -> Result<PaymentStatus, CoreError> {
        self.payment_status.parse()
    }

    pub fn label(&self) -> String {
        period_label(self.period_start)
    }
}

/// Fields written by a payment-status transition.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub paid_at: Option<Timestamp>,
    pub paid_amount_cents: Option<i64>,
    pub payment_reference: Option<String>,
    pub payment_notes: Option<String>,
}
