//! Invite code entity model.

use serde::Serialize;
use sqlx::FromRow;
use tally_core::types::{DbId, Timestamp};

/// A row from the `invite_codes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InviteCode {
    pub id: DbId,
    pub code: String,
    pub is_active: bool,
    pub expires_at: Option<Timestamp>,
    pub used_at: Option<Timestamp>,
    pub used_by: Option<DbId>,
    pub created_at: Timestamp,
}
