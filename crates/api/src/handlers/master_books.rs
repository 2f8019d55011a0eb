//! Handlers for the `/master-books` resource.

use axum::extract::{Path, State};
use axum::Json;
use kdpdesk_core::types::DbId;
use kdpdesk_db::models::master_book::MasterBook;
use kdpdesk_db::repositories::{KdpImportRepo, MasterBookRepo};

use crate::engine::master_books::{update_from_import, MasterBookUpdate};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/master-books
///
/// Ordered by USD royalties, highest first.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<MasterBook>>>> {
    let books = MasterBookRepo::list(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: books }))
}

/// GET /api/v1/master-books/{asin}
///
/// Every format recorded for the ASIN.
pub async fn get_by_asin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(asin): Path<String>,
) -> AppResult<Json<DataResponse<Vec<MasterBook>>>> {
    let books = MasterBookRepo::find_by_asin(&state.pool, auth.user_id, &asin).await?;
    if books.is_empty() {
        return Err(AppError::NotFound(format!("No master book for ASIN {asin}")));
    }
    Ok(Json(DataResponse { data: books }))
}

/// POST /api/v1/master-books/update/{import_id}
///
/// Fold a completed import into the master books. Re-running for the same
/// import changes nothing.
pub async fn update_from(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(import_id): Path<DbId>,
) -> AppResult<Json<MasterBookUpdate>> {
    KdpImportRepo::find_by_id(&state.pool, auth.user_id, import_id)
        .await?
        .ok_or_else(|| AppError::not_found("KdpImport", import_id))?;
    let result = update_from_import(&state.pool, auth.user_id, import_id).await?;
    Ok(Json(result))
}
