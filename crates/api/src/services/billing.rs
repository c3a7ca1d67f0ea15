//! Billing period accounting.
//!
//! One row per (user, calendar month). At most one of a user's rows has
//! `is_current = true`; both rules are enforced by unique indexes, and the
//! get-or-create path below serializes creators on the user row so the
//! indexes are a backstop rather than the normal way races resolve.

use sqlx::{PgConnection, PgPool};
use tally_core::billing::{
    overdue_cutoff, validate_transition, PaymentMetadata, PaymentStatus, PeriodWindow,
};
use tally_core::clock::Clock;
use tally_core::error::CoreError;
use tally_core::types::{DbId, Timestamp};
use tally_db::models::billing_period::{BillingPeriod, PaymentUpdate};
use tally_db::repositories::{BillingPeriodRepo, UserRepo};

use crate::error::{AppError, AppResult};

/// Attempts at settling a get-or-create before giving up.
const MAX_CREATE_ATTEMPTS: usize = 3;

pub struct BillingAccountant<'a> {
    pool: &'a PgPool,
    clock: &'a dyn Clock,
}

impl<'a> BillingAccountant<'a> {
    pub fn new(pool: &'a PgPool, clock: &'a dyn Clock) -> Self {
        Self { pool, clock }
    }

    // -----------------------------------------------------------------------
    // Current period
    // -----------------------------------------------------------------------

    /// The user's period for the month containing "now", created on demand.
    pub async fn current_period(&self, user_id: DbId) -> AppResult<BillingPeriod> {
        let mut tx = self.pool.begin().await?;
        let period = Self::current_period_in(&mut tx, user_id, self.clock.now()).await?;
        tx.commit().await?;
        Ok(period)
    }

    /// Get-or-create the period containing `now` inside the caller's
    /// transaction.
    ///
    /// An existing row that lost its `is_current` flag (an interrupted
    /// rollover) is repaired. Any other current row for the user is demoted
    /// in the same transaction.
    pub async fn current_period_in(
        conn: &mut PgConnection,
        user_id: DbId,
        now: Timestamp,
    ) -> AppResult<BillingPeriod> {
        let window = PeriodWindow::containing_instant(now);

        // Fast path: the common case touches one indexed row and takes no lock.
        if let Some(period) = BillingPeriodRepo::find_by_start(conn, user_id, window.start).await? {
            if period.is_current {
                return Ok(period);
            }
        }

        // Slow path: serialize creators for this user.
        UserRepo::lock(conn, user_id).await?.ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?;

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            if let Some(existing) =
                BillingPeriodRepo::find_by_start(conn, user_id, window.start).await?
            {
                return Self::make_current(conn, existing).await;
            }

            let demoted = BillingPeriodRepo::demote_others(conn, user_id, window.start).await?;
            if let Some(created) =
                BillingPeriodRepo::insert_current(conn, user_id, window.start, window.end).await?
            {
                tracing::info!(
                    user_id,
                    billing_period_id = created.id,
                    period_start = %created.period_start,
                    demoted,
                    "Billing period opened",
                );
                return Ok(created);
            }

            // The insert hit a unique index: another writer got there first.
            tracing::debug!(user_id, attempt, "Billing period insert conflicted; retrying");
        }

        Err(AppError::Core(CoreError::Internal(format!(
            "billing period for user {user_id} did not settle after {MAX_CREATE_ATTEMPTS} attempts"
        ))))
    }

    async fn make_current(
        conn: &mut PgConnection,
        period: BillingPeriod,
    ) -> AppResult<BillingPeriod> {
        if period.is_current {
            return Ok(period);
        }
        BillingPeriodRepo::demote_others(conn, period.user_id, period.period_start).await?;
        let promoted = BillingPeriodRepo::promote(conn, period.id).await?;
        tracing::info!(
            user_id = promoted.user_id,
            billing_period_id = promoted.id,
            "Billing period restored as current",
        );
        Ok(promoted)
    }

    // -----------------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------------

    /// Atomically add to a period's totals. Deltas must be non-negative.
    pub async fn increment(
        conn: &mut PgConnection,
        period_id: DbId,
        request_delta: i64,
        cost_delta: i64,
    ) -> AppResult<BillingPeriod> {
        if request_delta < 0 || cost_delta < 0 {
            return Err(CoreError::Validation(
                "billing counters can only increase".into(),
            )
            .into());
        }
        BillingPeriodRepo::increment(conn, period_id, request_delta, cost_delta)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "BillingPeriod",
                    id: period_id,
                }
                .into()
            })
    }

    // -----------------------------------------------------------------------
    // Payment status
    // -----------------------------------------------------------------------

    /// Move a closed period to a new payment status.
    ///
    /// The row is locked for the duration of the check-and-write, so a
    /// rejected transition leaves no trace and two concurrent transitions
    /// cannot both pass validation.
    pub async fn transition(
        &self,
        period_id: DbId,
        to: PaymentStatus,
        metadata: PaymentMetadata,
    ) -> AppResult<BillingPeriod> {
        metadata.validate()?;

        let mut tx = self.pool.begin().await?;
        let period = BillingPeriodRepo::find_for_update(&mut tx, period_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "BillingPeriod",
                id: period_id,
            })?;

        // This month's row counts as open even if its flag was lost, so a
        // later repair can never promote a settled period.
        let now = self.clock.now();
        let open = period.is_current
            || PeriodWindow::containing_instant(now).start == period.period_start;

        let from = period.status()?;
        validate_transition(from, to, open)?;

        let update = match to {
            PaymentStatus::Paid => PaymentUpdate {
                status: to,
                paid_at: Some(now),
                paid_amount_cents: Some(metadata.amount_cents.unwrap_or(period.total_cost_cents)),
                payment_reference: metadata.reference,
                payment_notes: metadata.notes,
            },
            _ => PaymentUpdate {
                status: to,
                paid_at: None,
                paid_amount_cents: None,
                payment_reference: metadata.reference,
                payment_notes: metadata.notes,
            },
        };

        let updated = BillingPeriodRepo::apply_payment_update(&mut tx, period_id, &update).await?;
        tx.commit().await?;

        tracing::info!(
            billing_period_id = period_id,
            user_id = updated.user_id,
            from = %from,
            to = %to,
            "Billing period payment status changed",
        );
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Batch jobs
    // -----------------------------------------------------------------------

    /// Mark every closed `pending` period that ended more than `after_days`
    /// ago as `overdue`. Returns the IDs that changed.
    pub async fn mark_overdue(&self, after_days: i64) -> AppResult<Vec<DbId>> {
        let cutoff = overdue_cutoff(self.clock.now().date_naive(), after_days)?;
        let candidates = BillingPeriodRepo::list_overdue_candidates(self.pool, cutoff).await?;

        let mut marked = Vec::with_capacity(candidates.len());
        for id in candidates {
            match self
                .transition(id, PaymentStatus::Overdue, PaymentMetadata::default())
                .await
            {
                Ok(_) => marked.push(id),
                // Paid or waived between the scan and the lock.
                Err(AppError::Core(CoreError::InvalidTransition { from, .. })) => {
                    tracing::debug!(billing_period_id = id, from = %from, "Skipping overdue mark");
                }
                Err(e) => return Err(e),
            }
        }

        if !marked.is_empty() {
            tracing::info!(count = marked.len(), %cutoff, "Billing periods marked overdue");
        }
        Ok(marked)
    }

    /// Run `current_period` for every active user so months roll over
    /// without waiting for traffic. Returns how many users were processed.
    ///
    /// A failure for one user is logged and does not stop the pass.
    pub async fn ensure_current_periods(&self) -> AppResult<usize> {
        let user_ids = UserRepo::list_active_ids(self.pool).await?;
        let mut processed = 0;
        for user_id in user_ids {
            match self.current_period(user_id).await {
                Ok(_) => processed += 1,
                Err(e) => {
                    tracing::error!(user_id, error = %e, "Failed to ensure current billing period");
                }
            }
        }
        Ok(processed)
    }
}
