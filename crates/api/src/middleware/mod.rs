//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Resolves the caller from a session JWT or an API token.
//! - [`permissions::RequireActive`] -- Any active account.
//! - [`permissions::RequireVerified`] -- Active with a verified email.
//! - [`permissions::RequireApiToken`] -- Verified and authenticated by API token.
//! - [`permissions::RequireStaff`] -- Active staff account.

pub mod auth;
pub mod permissions;
