//! Repository for the singleton `settings` row.

use sqlx::{PgConnection, PgPool};

use crate::models::settings::Settings;

const COLUMNS: &str = "id, cost_per_request_cents, updated_at";

pub struct SettingsRepo;

impl SettingsRepo {
    /// Read the settings row, recreating it with defaults if it was removed.
    pub async fn get(conn: &mut PgConnection) -> Result<Settings, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings WHERE id = 1");
        if let Some(settings) = sqlx::query_as::<_, Settings>(&query)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok(settings);
        }

        tracing::warn!("Settings row missing; recreating with defaults");
        let insert = format!(
            "INSERT INTO settings (id) VALUES (1) \
             ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Settings>(&insert)
            .fetch_one(&mut *conn)
            .await
    }

    /// Update the per-request price.
    pub async fn set_cost_per_request(
        pool: &PgPool,
        cost_per_request_cents: i64,
    ) -> Result<Settings, sqlx::Error> {
        let query = format!(
            "UPDATE settings SET cost_per_request_cents = $1 WHERE id = 1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Settings>(&query)
            .bind(cost_per_request_cents)
            .fetch_one(pool)
            .await
    }
}
