//! Handlers for the `/authors` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use kdpdesk_core::error::CoreError;
use kdpdesk_core::types::DbId;
use kdpdesk_db::models::author::{Author, AuthorWithCounts, CreateAuthor, UpdateAuthor};
use kdpdesk_db::models::book::Book;
use kdpdesk_db::repositories::AuthorRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn require_first_name(first_name: &str) -> AppResult<()> {
    if first_name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Author first name is required".into(),
        )));
    }
    Ok(())
}

/// POST /api/v1/authors
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateAuthor>,
) -> AppResult<(StatusCode, Json<Author>)> {
    require_first_name(&input.first_name)?;
    let author = AuthorRepo::create(&state.pool, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// GET /api/v1/authors
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<AuthorWithCounts>>>> {
    let authors = AuthorRepo::list_with_counts(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: authors }))
}

/// GET /api/v1/authors/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Author>> {
    let author = AuthorRepo::find_by_id(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Author", id))?;
    Ok(Json(author))
}

/// PUT /api/v1/authors/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAuthor>,
) -> AppResult<Json<Author>> {
    if let Some(first_name) = &input.first_name {
        require_first_name(first_name)?;
    }
    let author = AuthorRepo::update(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Author", id))?;
    Ok(Json(author))
}

/// DELETE /api/v1/authors/{id}
///
/// Linked books keep their copied author fields.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if AuthorRepo::delete(&state.pool, auth.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Author", id))
    }
}

/// GET /api/v1/authors/{id}/books
pub async fn list_books(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Book>>>> {
    AuthorRepo::find_by_id(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Author", id))?;
    let books = AuthorRepo::list_books(&state.pool, auth.user_id, id).await?;
    Ok(Json(DataResponse { data: books }))
}
