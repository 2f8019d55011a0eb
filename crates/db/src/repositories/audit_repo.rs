//! Repository for the append-only `admin_audit_log` table.

use sqlx::PgPool;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

const COLUMNS: &str =
    "id, user_id, action, resource, resource_id, details, ip_address, user_agent, created_at";

pub struct AuditLogRepo;

impl AuditLogRepo {
    pub async fn create(pool: &PgPool, input: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO admin_audit_log
                (user_id, action, resource, resource_id, details, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.user_id)
            .bind(&input.action)
            .bind(&input.resource)
            .bind(&input.resource_id)
            .bind(&input.details)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .fetch_one(pool)
            .await
    }

    /// Entries matching every set filter, newest first.
    pub async fn query(pool: &PgPool, params: &AuditQuery) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM admin_audit_log
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::TEXT IS NULL OR action = $2)
               AND ($3::TEXT IS NULL OR resource = $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(params.user_id)
            .bind(&params.action)
            .bind(&params.resource)
            .bind(params.limit.unwrap_or(50).clamp(1, 500))
            .bind(params.offset.unwrap_or(0).max(0))
            .fetch_all(pool)
            .await
    }
}
