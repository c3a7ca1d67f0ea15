use std::sync::Arc;

use tally_core::clock::Clock;

use crate::config::ServerConfig;
use crate::services::billing::BillingAccountant;
use crate::services::ledger::UsageLedger;
use crate::services::token_auth::TokenAuthenticator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tally_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Source of "now" for billing windows and persisted timestamps.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn authenticator(&self) -> TokenAuthenticator<'_> {
        TokenAuthenticator::new(&self.pool, self.clock.as_ref())
    }

    pub fn accountant(&self) -> BillingAccountant<'_> {
        BillingAccountant::new(&self.pool, self.clock.as_ref())
    }

    pub fn ledger(&self) -> UsageLedger<'_> {
        UsageLedger::new(&self.pool, self.clock.as_ref())
    }
}
