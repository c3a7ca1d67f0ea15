//! Domain services that coordinate repositories inside transactions.
//!
//! - [`token_auth`] -- bearer token to (user, token) resolution.
//! - [`billing`] -- billing period get-or-create, counters, and payment status.
//! - [`ledger`] -- append-only usage recording tied to the current period.
//!
//! Each service borrows the pool and clock from [`crate::state::AppState`].

pub mod billing;
pub mod ledger;
pub mod token_auth;
