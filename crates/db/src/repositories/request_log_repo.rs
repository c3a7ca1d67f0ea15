//! Repository for the append-only `request_logs` table.
//!
//! Rows are immutable once written; a trigger rejects updates.

use sqlx::{PgConnection, PgPool};
use tally_core::types::{DbId, Timestamp};

use crate::models::request_log::{NewRequestLog, RequestLog, RequestLogListItem};

const COLUMNS: &str = "\
    id, user_id, api_token_id, billing_period_id, service, request_ts, duration_ms, \
    request_bytes, response_bytes, status, error_code, request_id, result";

const LIST_COLUMNS: &str = "\
    rl.id, rl.request_ts, rl.service, rl.status, rl.error_code, rl.duration_ms, \
    rl.request_bytes, rl.response_bytes, rl.request_id, t.token_prefix";

pub struct RequestLogRepo;

impl RequestLogRepo {
    /// Append a ledger entry.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewRequestLog,
    ) -> Result<RequestLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO request_logs \
                (user_id, api_token_id, billing_period_id, service, request_ts, duration_ms, \
                 request_bytes, response_bytes, status, error_code, request_id, result) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RequestLog>(&query)
            .bind(input.user_id)
            .bind(input.api_token_id)
            .bind(input.billing_period_id)
            .bind(&input.service)
            .bind(input.request_ts)
            .bind(input.duration_ms)
            .bind(input.request_bytes)
            .bind(input.response_bytes)
            .bind(&input.status)
            .bind(&input.error_code)
            .bind(input.request_id)
            .bind(&input.result)
            .fetch_one(&mut *conn)
            .await
    }

    /// Find a ledger entry by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<RequestLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM request_logs WHERE id = $1");
        sqlx::query_as::<_, RequestLog>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Page through a user's entries, newest first, within an optional
    /// inclusive `[from, to]` range.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RequestLogListItem>, sqlx::Error> {
        let query = format!(
            "SELECT {LIST_COLUMNS} \
             FROM request_logs rl \
             LEFT JOIN api_tokens t ON rl.api_token_id = t.id \
             WHERE rl.user_id = $1 \
               AND ($2::TIMESTAMPTZ IS NULL OR rl.request_ts >= $2) \
               AND ($3::TIMESTAMPTZ IS NULL OR rl.request_ts <= $3) \
             ORDER BY rl.request_ts DESC, rl.id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, RequestLogListItem>(&query)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count a user's entries within an optional `[from, to]` range.
    pub async fn count_for_user(
        pool: &PgPool,
        user_id: DbId,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM request_logs \
             WHERE user_id = $1 \
               AND ($2::TIMESTAMPTZ IS NULL OR request_ts >= $2) \
               AND ($3::TIMESTAMPTZ IS NULL OR request_ts <= $3)",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await
    }

    /// Count a user's entries in the half-open range `[from, until)`.
    pub async fn count_between(
        pool: &PgPool,
        user_id: DbId,
        from: Timestamp,
        until: Option<Timestamp>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM request_logs \
             WHERE user_id = $1 AND request_ts >= $2 \
               AND ($3::TIMESTAMPTZ IS NULL OR request_ts < $3)",
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_one(pool)
        .await
    }

    /// Timestamp of the user's most recent entry.
    pub async fn latest_ts(pool: &PgPool, user_id: DbId) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(request_ts) FROM request_logs WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Page through the entries attached to one billing period, newest first.
    pub async fn list_for_period(
        pool: &PgPool,
        billing_period_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RequestLogListItem>, sqlx::Error> {
        let query = format!(
            "SELECT {LIST_COLUMNS} \
             FROM request_logs rl \
             LEFT JOIN api_tokens t ON rl.api_token_id = t.id \
             WHERE rl.billing_period_id = $1 \
             ORDER BY rl.request_ts DESC, rl.id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, RequestLogListItem>(&query)
            .bind(billing_period_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count the entries attached to one billing period.
    pub async fn count_for_period(pool: &PgPool, billing_period_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM request_logs WHERE billing_period_id = $1")
            .bind(billing_period_id)
            .fetch_one(pool)
            .await
    }
}
