//! Repository for the `billing_periods` table.
//!
//! Methods that participate in the get-or-create and ledger transactions take
//! `&mut PgConnection`; read-only listings take `&PgPool`.

use sqlx::{PgConnection, PgPool};
use tally_core::billing::PaymentStatus;
use tally_core::types::{Date, DbId};

use crate::models::billing_period::{BillingPeriod, PaymentUpdate};

const COLUMNS: &str = "\
    id, user_id, period_start, period_end, total_requests, total_cost_cents, \
    is_current, payment_status, paid_at, paid_amount_cents, payment_reference, \
    payment_notes, created_at, updated_at";

/// Provides get-or-create building blocks, counters, and payment updates.
pub struct BillingPeriodRepo;

impl BillingPeriodRepo {
    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Find the period starting on `period_start` for `user_id`.
    pub async fn find_by_start(
        conn: &mut PgConnection,
        user_id: DbId,
        period_start: Date,
    ) -> Result<Option<BillingPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM billing_periods WHERE user_id = $1 AND period_start = $2"
        );
        sqlx::query_as::<_, BillingPeriod>(&query)
            .bind(user_id)
            .bind(period_start)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find a period by ID and take a row lock until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<BillingPeriod>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM billing_periods WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, BillingPeriod>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find a period by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<BillingPeriod>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM billing_periods WHERE id = $1");
        sqlx::query_as::<_, BillingPeriod>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a period by ID, scoped to its owner.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<BillingPeriod>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM billing_periods WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, BillingPeriod>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's periods, newest first, optionally filtered by status.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<BillingPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM billing_periods \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR payment_status = $2) \
             ORDER BY period_start DESC"
        );
        sqlx::query_as::<_, BillingPeriod>(&query)
            .bind(user_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(pool)
            .await
    }

    /// Count rows for a user. Used to check the one-row-per-month invariant.
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM billing_periods WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// IDs of closed `pending` periods that ended before `cutoff`.
    pub async fn list_overdue_candidates(
        pool: &PgPool,
        cutoff: Date,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM billing_periods \
             WHERE period_end < $1 AND payment_status = 'pending' AND is_current = false \
             ORDER BY period_end, id",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Rollover
    // -----------------------------------------------------------------------

    /// Clear `is_current` on every other current row for `user_id`.
    pub async fn demote_others(
        conn: &mut PgConnection,
        user_id: DbId,
        keep_start: Date,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE billing_periods SET is_current = false \
             WHERE user_id = $1 AND is_current = true AND period_start <> $2",
        )
        .bind(user_id)
        .bind(keep_start)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mark an existing row current.
    pub async fn promote(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<BillingPeriod, sqlx::Error> {
        let query = format!(
            "UPDATE billing_periods SET is_current = true WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BillingPeriod>(&query)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Insert a new current period.
    ///
    /// Returns `None` instead of failing when a unique constraint already
    /// holds a conflicting row, so the surrounding transaction stays usable.
    pub async fn insert_current(
        conn: &mut PgConnection,
        user_id: DbId,
        period_start: Date,
        period_end: Date,
    ) -> Result<Option<BillingPeriod>, sqlx::Error> {
        let query = format!(
            "INSERT INTO billing_periods (user_id, period_start, period_end, is_current) \
             VALUES ($1, $2, $3, true) \
             ON CONFLICT DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BillingPeriod>(&query)
            .bind(user_id)
            .bind(period_start)
            .bind(period_end)
            .fetch_optional(&mut *conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------------

    /// Add to the running totals in one atomic UPDATE.
    pub async fn increment(
        conn: &mut PgConnection,
        id: DbId,
        request_delta: i64,
        cost_delta: i64,
    ) -> Result<Option<BillingPeriod>, sqlx::Error> {
        let query = format!(
            "UPDATE billing_periods SET \
                 total_requests = total_requests + $2, \
                 total_cost_cents = total_cost_cents + $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BillingPeriod>(&query)
            .bind(id)
            .bind(request_delta)
            .bind(cost_delta)
            .fetch_optional(&mut *conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Payment status
    // -----------------------------------------------------------------------

    /// Write a validated payment-status change.
    ///
    /// `None` metadata fields leave the stored value unchanged.
    pub async fn apply_payment_update(
        conn: &mut PgConnection,
        id: DbId,
        update: &PaymentUpdate,
    ) -> Result<BillingPeriod, sqlx::Error> {
        let query = format!(
            "UPDATE billing_periods SET \
                 payment_status = $2, \
                 paid_at = COALESCE($3, paid_at), \
                 paid_amount_cents = COALESCE($4, paid_amount_cents), \
                 payment_reference = COALESCE($5, payment_reference), \
                 payment_notes = COALESCE($6, payment_notes) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BillingPeriod>(&query)
            .bind(id)
            .bind(update.status.as_str())
            .bind(update.paid_at)
            .bind(update.paid_amount_cents)
            .bind(update.payment_reference.as_deref())
            .bind(update.payment_notes.as_deref())
            .fetch_one(&mut *conn)
            .await
    }
}
