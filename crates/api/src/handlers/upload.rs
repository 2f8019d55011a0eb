//! Shared multipart handling for report uploads.

use axum::body::Bytes;
use axum::extract::Multipart;
use kdpdesk_core::kdp::spreadsheet::{read_workbook, Workbook};
use kdpdesk_core::validation::validate_upload;

use crate::error::{AppError, AppResult};

/// Multipart field carrying the report.
pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Pull the `file` field out of the form and check its name and size.
pub async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Uploaded file has no name".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;

        validate_upload(&file_name, bytes.len(), max_bytes)?;
        return Ok(UploadedFile { file_name, bytes });
    }

    Err(AppError::BadRequest("No file uploaded".into()))
}

/// Parse the workbook on the blocking pool.
pub async fn parse_workbook(file: &UploadedFile) -> AppResult<Workbook> {
    let bytes = file.bytes.clone();
    let file_name = file.file_name.clone();
    let workbook = tokio::task::spawn_blocking(move || read_workbook(&bytes, &file_name))
        .await
        .map_err(|e| AppError::InternalError(format!("Parse task failed: {e}")))??;
    Ok(workbook)
}
