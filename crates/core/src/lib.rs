//! Domain logic shared by the database and HTTP layers.
//!
//! Nothing in this crate touches the database; every function here is pure
//! or depends only on an injected [`clock::Clock`].

pub mod api_tokens;
pub mod billing;
pub mod clock;
pub mod error;
pub mod hashing;
pub mod invite_codes;
pub mod pagination;
pub mod permissions;
pub mod types;
pub mod usage;
