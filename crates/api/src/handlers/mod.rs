pub mod admin;
pub mod auth;
pub mod billing;
pub mod services;
pub mod tokens;
pub mod usage;
