//! Handlers for the `/kdp-imports` resource: the ingestion pipeline surface.
//!
//! An upload is parsed and registered synchronously, then processed by a
//! background [`ImportProcessor`]; clients poll `GET /kdp-imports/{id}` for
//! progress.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use kdpdesk_core::currency::round2;
use kdpdesk_core::kdp::detection::{detect_file_type, KdpFileType};
use kdpdesk_core::kdp::reconcile::{AutoCreationOptions, BookCreationResult, ImportPreview};
use kdpdesk_core::types::DbId;
use kdpdesk_db::models::estimator_data::EstimatorBucket;
use kdpdesk_db::models::kdp_import::{CreateKdpImport, KdpImport};
use kdpdesk_db::models::kdp_import_data::KdpImportData;
use kdpdesk_db::repositories::{EstimatorDataRepo, KdpImportDataRepo, KdpImportRepo};
use serde::Serialize;

use crate::engine::book_sync;
use crate::engine::kdp_import::ImportProcessor;
use crate::error::{AppError, AppResult};
use crate::handlers::upload::{parse_workbook, read_upload};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImportDataPage {
    pub data: Vec<KdpImportData>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct EstimatorStats {
    pub import_id: DbId,
    /// Totals leave out the summary sheet, which repeats the per-format rows.
    pub total_records: i64,
    pub total_royalty_usd: f64,
    pub buckets: Vec<EstimatorBucket>,
}

async fn find_owned(state: &AppState, user_id: DbId, id: DbId) -> AppResult<KdpImport> {
    KdpImportRepo::find_by_id(&state.pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("KdpImport", id))
}

/// POST /api/v1/kdp-imports/upload
///
/// Register the report and start processing it in the background.
/// Responds 202 with the `pending` import.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<KdpImport>)> {
    let file = read_upload(multipart, state.config.max_upload_bytes).await?;
    let workbook = parse_workbook(&file).await?;

    let file_type = detect_file_type(&file.file_name, &workbook);
    let summary = workbook.summary();
    let summary_json = serde_json::to_value(&summary)
        .map_err(|e| AppError::InternalError(format!("Summary serialization failed: {e}")))?;

    let import = KdpImportRepo::create(
        &state.pool,
        auth.user_id,
        &CreateKdpImport {
            file_name: file.file_name.clone(),
            file_size: file.bytes.len() as i64,
            detected_type: file_type.as_str().to_string(),
            total_records: summary.estimated_records as i32,
            summary: summary_json,
        },
    )
    .await?;

    tracing::info!(
        import_id = import.id,
        user_id = auth.user_id,
        file_name = %import.file_name,
        file_type = %file_type,
        sheets = summary.total_sheets,
        "Import registered",
    );

    ImportProcessor::new(state.pool.clone(), import.id, auth.user_id, file_type)
        .spawn(&state.import_tasks, workbook);

    Ok((StatusCode::ACCEPTED, Json(import)))
}

/// GET /api/v1/kdp-imports?limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<KdpImport>>>> {
    let imports = KdpImportRepo::list(&state.pool, auth.user_id, page.limit(), page.offset()).await?;
    Ok(Json(DataResponse { data: imports }))
}

/// GET /api/v1/kdp-imports/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<KdpImport>> {
    Ok(Json(find_owned(&state, auth.user_id, id).await?))
}

/// DELETE /api/v1/kdp-imports/{id}
///
/// Stored rows are removed with the import; master books keep their totals.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if KdpImportRepo::delete(&state.pool, auth.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("KdpImport", id))
    }
}

/// GET /api/v1/kdp-imports/{id}/data?limit=&offset=
pub async fn list_data(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ImportDataPage>> {
    find_owned(&state, auth.user_id, id).await?;
    let (limit, offset) = (page.limit(), page.offset());
    let data = KdpImportDataRepo::list_by_import(&state.pool, auth.user_id, id, limit, offset).await?;
    let total = KdpImportDataRepo::count_by_import(&state.pool, auth.user_id, id).await?;
    Ok(Json(ImportDataPage {
        data,
        total,
        limit,
        offset,
    }))
}

/// GET /api/v1/kdp-imports/{id}/preview
pub async fn preview(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ImportPreview>> {
    let import = find_owned(&state, auth.user_id, id).await?;
    let preview = book_sync::preview(&state.pool, auth.user_id, &import).await?;
    Ok(Json(preview))
}

/// POST /api/v1/kdp-imports/{id}/create-books
///
/// Body: `{ "update_existing_books": bool, "link_authors": bool }`.
pub async fn create_books(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(options): Json<AutoCreationOptions>,
) -> AppResult<Json<BookCreationResult>> {
    let import = find_owned(&state, auth.user_id, id).await?;
    let result = book_sync::create_books(&state.pool, auth.user_id, &import, options).await?;
    Ok(Json(result))
}

/// GET /api/v1/kdp-imports/{id}/estimator-stats
pub async fn estimator_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<EstimatorStats>> {
    find_owned(&state, auth.user_id, id).await?;
    let buckets = EstimatorDataRepo::stats(&state.pool, auth.user_id, id).await?;
    let per_format = || {
        buckets
            .iter()
            .filter(|b| KdpFileType::RoyaltiesEstimator.normalizes_sheet(&b.sheet_name))
    };
    Ok(Json(EstimatorStats {
        import_id: id,
        total_records: per_format().map(|b| b.record_count).sum(),
        total_royalty_usd: round2(per_format().map(|b| b.total_royalty_usd).sum()),
        buckets,
    }))
}
