//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Insert DTOs or response projections where the row itself is not enough

pub mod api_token;
pub mod billing_period;
pub mod invite_code;
pub mod request_log;
pub mod settings;
pub mod user;
