//! API token entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tally_core::types::{DbId, Timestamp};

/// A row from the `api_tokens` table.
///
/// **Note:** `token_hash` is never serialized to responses. The
/// `token_prefix` field is used for human-readable identification.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApiToken {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub token_prefix: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub created_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub last_used_at: Option<Timestamp>,
}

impl ApiToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Response returned when a new token is created.
/// Includes the plaintext token (shown exactly once).
#[derive(Debug, Clone, Serialize)]
pub struct ApiTokenCreatedResponse {
    pub id: DbId,
    pub name: String,
    pub token_prefix: String,
    /// The full plaintext token. Shown **once** and never stored.
    pub token: String,
    pub created_at: Timestamp,
}

/// DTO for creating a new token.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiToken {
    pub name: String,
}
