//! Periodic billing maintenance.
//!
//! Each pass opens this month's period for every active user (so rollover
//! does not wait for the first request of the month) and then marks closed
//! pending periods overdue once they are older than the configured cutoff.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tally_core::clock::Clock;
use tokio_util::sync::CancellationToken;

use crate::config::BillingConfig;
use crate::services::billing::BillingAccountant;

/// Run the billing maintenance loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    clock: Arc<dyn Clock>,
    config: BillingConfig,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = config.job_interval_secs,
        overdue_after_days = config.overdue_after_days,
        "Billing jobs started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.job_interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Billing jobs stopping");
                break;
            }
            _ = interval.tick() => {
                run_once(&pool, clock.as_ref(), config).await;
            }
        }
    }
}

/// One maintenance pass. Errors are logged; the loop keeps going.
pub async fn run_once(pool: &PgPool, clock: &dyn Clock, config: BillingConfig) {
    let accountant = BillingAccountant::new(pool, clock);

    match accountant.ensure_current_periods().await {
        Ok(processed) => tracing::debug!(processed, "Billing rollover pass complete"),
        Err(e) => tracing::error!(error = %e, "Billing rollover pass failed"),
    }

    match accountant.mark_overdue(config.overdue_after_days).await {
        Ok(marked) if !marked.is_empty() => {
            tracing::info!(count = marked.len(), "Billing overdue pass marked periods");
        }
        Ok(_) => tracing::debug!("Billing overdue pass: nothing to mark"),
        Err(e) => tracing::error!(error = %e, "Billing overdue pass failed"),
    }
}
