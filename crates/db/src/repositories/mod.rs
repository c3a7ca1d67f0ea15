//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument, or `&mut PgConnection` when the call must
//! join a caller-owned transaction.

pub mod api_token_repo;
pub mod billing_period_repo;
pub mod invite_code_repo;
pub mod request_log_repo;
pub mod settings_repo;
pub mod user_repo;

pub use api_token_repo::ApiTokenRepo;
pub use billing_period_repo::BillingPeriodRepo;
pub use invite_code_repo::InviteCodeRepo;
pub use request_log_repo::RequestLogRepo;
pub use settings_repo::SettingsRepo;
pub use user_repo::UserRepo;
