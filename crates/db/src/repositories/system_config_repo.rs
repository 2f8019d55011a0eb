//! Repository for the `system_config` key/value table.

use kdpdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::system_config::{SystemConfig, UpsertSystemConfig};

const COLUMNS: &str = "key, value, description, updated_by, created_at, updated_at";

pub struct SystemConfigRepo;

impl SystemConfigRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<SystemConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM system_config ORDER BY key");
        sqlx::query_as::<_, SystemConfig>(&query).fetch_all(pool).await
    }

    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<SystemConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM system_config WHERE key = $1");
        sqlx::query_as::<_, SystemConfig>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Insert or update a setting. A `None` description keeps the stored one.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertSystemConfig,
        updated_by: DbId,
    ) -> Result<SystemConfig, sqlx::Error> {
        let query = format!(
            "INSERT INTO system_config (key, value, description, updated_by)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                description = COALESCE(EXCLUDED.description, system_config.description),
                updated_by = EXCLUDED.updated_by
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SystemConfig>(&query)
            .bind(&input.key)
            .bind(&input.value)
            .bind(&input.description)
            .bind(updated_by)
            .fetch_one(pool)
            .await
    }
}
