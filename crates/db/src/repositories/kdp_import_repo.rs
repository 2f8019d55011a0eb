//! Repository for the `kdp_imports` table: the lifecycle of one upload.

use kdpdesk_core::import_status::{
    IMPORT_COMPLETED, IMPORT_FAILED, IMPORT_PENDING, IMPORT_PROCESSING,
};
use kdpdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::kdp_import::{CreateKdpImport, ImportCompletion, KdpImport};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, file_name, file_size, detected_type, status, progress, \
                        current_step, total_records, processed_records, error_records, \
                        duplicate_records, summary, error_log, mapping_config, completed_at, \
                        created_at, updated_at";

pub struct KdpImportRepo;

impl KdpImportRepo {
    /// Register an uploaded file in `pending` state.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateKdpImport,
    ) -> Result<KdpImport, sqlx::Error> {
        let query = format!(
            "INSERT INTO kdp_imports (user_id, file_name, file_size, detected_type,
                                      total_records, summary)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, KdpImport>(&query)
            .bind(user_id)
            .bind(&input.file_name)
            .bind(input.file_size)
            .bind(&input.detected_type)
            .bind(input.total_records)
            .bind(&input.summary)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<KdpImport>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM kdp_imports WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, KdpImport>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// The user's imports, newest first.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KdpImport>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kdp_imports
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, KdpImport>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Completed imports of a detected type, oldest first.
    pub async fn list_completed_ids_by_type(
        pool: &PgPool,
        user_id: DbId,
        detected_type: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM kdp_imports
             WHERE user_id = $1 AND detected_type = $2 AND status = $3
             ORDER BY created_at, id",
        )
        .bind(user_id)
        .bind(detected_type)
        .bind(IMPORT_COMPLETED)
        .fetch_all(pool)
        .await
    }

    pub async fn mark_processing(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE kdp_imports SET status = $2, progress = 0 WHERE id = $1")
            .bind(id)
            .bind(IMPORT_PROCESSING)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a progress step. Progress never moves backwards.
    pub async fn update_progress(
        pool: &PgPool,
        id: DbId,
        progress: i32,
        step: &str,
        processed_records: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE kdp_imports SET
                progress = GREATEST(progress, $2),
                current_step = $3,
                processed_records = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(progress.clamp(0, 100))
        .bind(step)
        .bind(processed_records)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark an import `completed` with its final figures.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        input: &ImportCompletion,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE kdp_imports SET
                status = $2,
                progress = 100,
                current_step = 'Import completed successfully',
                processed_records = $3,
                error_records = $4,
                duplicate_records = $5,
                error_log = $6,
                summary = $7,
                mapping_config = $8,
                completed_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(IMPORT_COMPLETED)
        .bind(input.processed_records)
        .bind(input.error_records)
        .bind(input.duplicate_records)
        .bind(&input.error_log)
        .bind(&input.summary)
        .bind(&input.mapping_config)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark an import `failed`, appending `message` to its error log.
    pub async fn fail(pool: &PgPool, id: DbId, message: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE kdp_imports SET
                status = $2,
                current_step = 'Import failed',
                error_log = array_append(error_log, $3),
                completed_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(IMPORT_FAILED)
        .bind(message)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fail every import still `pending` or `processing`. Run at startup,
    /// when no processor can be working on them. Returns the number failed.
    pub async fn fail_interrupted(pool: &PgPool, message: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE kdp_imports SET
                status = $1,
                current_step = 'Import failed',
                error_log = array_append(error_log, $2),
                completed_at = NOW()
             WHERE status IN ($3, $4)",
        )
        .bind(IMPORT_FAILED)
        .bind(message)
        .bind(IMPORT_PENDING)
        .bind(IMPORT_PROCESSING)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete an import; its data rows go with it.
    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM kdp_imports WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Import counts per status across all users.
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as("SELECT status, COUNT(*) FROM kdp_imports GROUP BY status ORDER BY status")
            .fetch_all(pool)
            .await
    }
}
