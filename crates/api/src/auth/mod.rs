//! Session authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing off the async executor.
//! - [`jwt`] -- HS256 session token generation and validation.
//!
//! API tokens are handled separately by
//! [`crate::services::token_auth::TokenAuthenticator`].

pub mod jwt;
pub mod password;
