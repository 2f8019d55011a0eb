//! KDP import model and DTOs.

use kdpdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `kdp_imports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct KdpImport {
    pub id: DbId,
    pub user_id: DbId,
    pub file_name: String,
    pub file_size: i64,
    /// One of the `KdpFileType` snake-case names.
    pub detected_type: String,
    pub status: String,
    pub progress: i32,
    pub current_step: Option<String>,
    pub total_records: i32,
    pub processed_records: i32,
    pub error_records: i32,
    pub duplicate_records: i32,
    /// Workbook summary plus validation and estimator outcome.
    pub summary: Option<serde_json::Value>,
    pub error_log: Vec<String>,
    /// `{ sheet: { header: field } }` for every sheet that was read.
    pub mapping_config: Option<serde_json::Value>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering an uploaded file.
#[derive(Debug, Clone)]
pub struct CreateKdpImport {
    pub file_name: String,
    pub file_size: i64,
    pub detected_type: String,
    pub total_records: i32,
    pub summary: serde_json::Value,
}

/// Final figures written when processing succeeds.
#[derive(Debug, Clone)]
pub struct ImportCompletion {
    pub processed_records: i32,
    pub error_records: i32,
    pub duplicate_records: i32,
    pub error_log: Vec<String>,
    pub summary: serde_json::Value,
    pub mapping_config: serde_json::Value,
}
