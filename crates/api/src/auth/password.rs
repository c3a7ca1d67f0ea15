//! Password hashing for the credential store.
//!
//! Argon2id is CPU-bound; both directions run on the blocking thread pool.

use tally_core::hashing::{hash_secret, verify_secret};

use crate::error::{AppError, AppResult};

/// Hash a plaintext password into a PHC string.
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_secret(&password))
        .await
        .map_err(AppError::blocking)?
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
}

/// Check a plaintext password against a stored PHC hash.
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_secret(&password, &hash))
        .await
        .map_err(AppError::blocking)?
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))
}
