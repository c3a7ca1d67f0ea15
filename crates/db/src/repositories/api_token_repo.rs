//! Repository for the `api_tokens` table.

use sqlx::PgPool;
use tally_core::types::{DbId, Timestamp};

use crate::models::api_token::ApiToken;

const COLUMNS: &str = "\
    id, user_id, name, token_prefix, token_hash, created_at, revoked_at, last_used_at";

/// Provides create, lookup, revoke, and touch operations for API tokens.
pub struct ApiTokenRepo;

impl ApiTokenRepo {
    /// Insert a new token row. Only the prefix and hash are stored.
    ///
    /// Fails with a unique violation on `uq_api_tokens_token_prefix` if the
    /// prefix is already taken; callers regenerate and retry.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        name: &str,
        token_prefix: &str,
        token_hash: &str,
        created_at: Timestamp,
    ) -> Result<ApiToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO api_tokens (user_id, name, token_prefix, token_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApiToken>(&query)
            .bind(user_id)
            .bind(name)
            .bind(token_prefix)
            .bind(token_hash)
            .bind(created_at)
            .fetch_one(pool)
            .await
    }

    /// Find the token whose stored prefix equals `token_prefix`.
    ///
    /// Indexed equality lookup on the unique prefix column; returns at most
    /// one candidate for hash verification.
    pub async fn find_by_prefix(
        pool: &PgPool,
        token_prefix: &str,
    ) -> Result<Option<ApiToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM api_tokens WHERE token_prefix = $1");
        sqlx::query_as::<_, ApiToken>(&query)
            .bind(token_prefix)
            .fetch_optional(pool)
            .await
    }

    /// Find a token by ID, scoped to its owner.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<ApiToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM api_tokens WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, ApiToken>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's tokens, newest first. Revoked tokens are included.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<ApiToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM api_tokens WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ApiToken>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Set `revoked_at` if it is still null.
    ///
    /// Returns `None` when the token does not exist for this user or was
    /// already revoked; an existing revocation time is never overwritten.
    pub async fn revoke(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<Option<ApiToken>, sqlx::Error> {
        let query = format!(
            "UPDATE api_tokens SET revoked_at = $3 \
             WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApiToken>(&query)
            .bind(id)
            .bind(user_id)
            .bind(at)
            .fetch_optional(pool)
            .await
    }

    /// Update `last_used_at`.
    pub async fn touch_last_used(pool: &PgPool, id: DbId, at: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE api_tokens SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }
}
