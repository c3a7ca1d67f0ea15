//! Repository for the `invite_codes` table.

use sqlx::{PgConnection, PgPool};
use tally_core::types::{DbId, Timestamp};

use crate::models::invite_code::InviteCode;

const COLUMNS: &str = "id, code, is_active, expires_at, used_at, used_by, created_at";

/// Provides create, list, and one-time redemption of invite codes.
pub struct InviteCodeRepo;

impl InviteCodeRepo {
    /// Insert a new invite code.
    pub async fn create(
        pool: &PgPool,
        code: &str,
        expires_at: Option<Timestamp>,
    ) -> Result<InviteCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO invite_codes (code, expires_at) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InviteCode>(&query)
            .bind(code)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// List invite codes, newest first.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InviteCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invite_codes ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, InviteCode>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find an invite code by its code string.
    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<InviteCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invite_codes WHERE code = $1");
        sqlx::query_as::<_, InviteCode>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Consume a redeemable code for `user_id` in a single conditional write.
    ///
    /// Returns `None` if the code is unknown, inactive, expired, or used.
    pub async fn redeem(
        conn: &mut PgConnection,
        code: &str,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Option<InviteCode>, sqlx::Error> {
        let query = format!(
            "UPDATE invite_codes SET used_by = $2, used_at = $3, is_active = false \
             WHERE code = $1 AND is_active = true AND used_by IS NULL AND used_at IS NULL \
               AND (expires_at IS NULL OR expires_at > $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InviteCode>(&query)
            .bind(code)
            .bind(user_id)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
    }
}
