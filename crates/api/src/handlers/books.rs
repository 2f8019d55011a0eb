//! Handlers for the `/books` resource and its contributors.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use kdpdesk_core::authors::display_name;
use kdpdesk_core::error::CoreError;
use kdpdesk_core::isbn::is_placeholder;
use kdpdesk_core::types::DbId;
use kdpdesk_core::validation::{validate_format, validate_title};
use kdpdesk_db::models::book::{Book, BookFilter, CreateBook, UpdateBook};
use kdpdesk_db::models::contributor::{Contributor, CreateContributor};
use kdpdesk_db::repositories::{BookRepo, ContributorRepo};
use serde::{Deserialize, Serialize};

use crate::engine::book_sync::unique_placeholder;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckIsbnParams {
    pub isbn: String,
    pub exclude_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct CheckIsbnResponse {
    pub isbn: String,
    pub available: bool,
}

async fn ensure_isbn_free(
    state: &AppState,
    isbn: Option<&str>,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    let Some(isbn) = isbn.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    if is_placeholder(isbn) {
        return Err(AppError::Core(CoreError::Validation(
            "Placeholder values cannot be used as an ISBN".into(),
        )));
    }
    if BookRepo::isbn_exists(&state.pool, isbn, exclude_id).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "ISBN {isbn} is already in use"
        ))));
    }
    Ok(())
}

async fn find_owned(state: &AppState, user_id: DbId, id: DbId) -> AppResult<Book> {
    BookRepo::find_by_id(&state.pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Book", id))
}

/// POST /api/v1/books
///
/// Books without an ISBN get a unique placeholder.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    validate_title(&input.title)?;
    if let Some(format) = &input.format {
        validate_format(format)?;
    }
    ensure_isbn_free(&state, input.isbn.as_deref(), None).await?;
    if input.isbn.as_deref().map_or(true, |s| s.trim().is_empty()) {
        input.isbn = None;
        input.isbn_placeholder = Some(unique_placeholder(&state.pool).await?);
    }

    let book = BookRepo::create(&state.pool, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /api/v1/books?project_id=&author_id=&format=&status=
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<BookFilter>,
) -> AppResult<Json<DataResponse<Vec<Book>>>> {
    let books = BookRepo::list(&state.pool, auth.user_id, &filter).await?;
    Ok(Json(DataResponse { data: books }))
}

/// GET /api/v1/books/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Book>> {
    Ok(Json(find_owned(&state, auth.user_id, id).await?))
}

/// PUT /api/v1/books/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    if let Some(format) = &input.format {
        validate_format(format)?;
    }
    ensure_isbn_free(&state, input.isbn.as_deref(), Some(id)).await?;

    let book = BookRepo::update(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Book", id))?;
    Ok(Json(book))
}

/// DELETE /api/v1/books/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if BookRepo::delete(&state.pool, auth.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Book", id))
    }
}

/// POST /api/v1/books/{id}/duplicate
pub async fn duplicate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let placeholder = unique_placeholder(&state.pool).await?;
    let copy = BookRepo::duplicate(&state.pool, auth.user_id, id, &placeholder)
        .await?
        .ok_or_else(|| AppError::not_found("Book", id))?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// GET /api/v1/books/check-isbn?isbn=&exclude_id=
pub async fn check_isbn(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<CheckIsbnParams>,
) -> AppResult<Json<CheckIsbnResponse>> {
    let isbn = params.isbn.trim().to_string();
    if isbn.is_empty() {
        return Err(AppError::BadRequest("isbn is required".into()));
    }
    let taken = BookRepo::isbn_exists(&state.pool, &isbn, params.exclude_id).await?;
    Ok(Json(CheckIsbnResponse {
        isbn,
        available: !taken,
    }))
}

// ---------------------------------------------------------------------------
// Contributors
// ---------------------------------------------------------------------------

/// GET /api/v1/books/{id}/contributors
pub async fn list_contributors(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Contributor>>>> {
    find_owned(&state, auth.user_id, id).await?;
    let contributors = ContributorRepo::list_for_book(&state.pool, id).await?;
    Ok(Json(DataResponse { data: contributors }))
}

/// POST /api/v1/books/{id}/contributors
///
/// `name` is rendered from the name parts when not given.
pub async fn add_contributor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CreateContributor>,
) -> AppResult<(StatusCode, Json<Contributor>)> {
    find_owned(&state, auth.user_id, id).await?;

    let name = match input.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.to_string(),
        None => display_name(
            input.prefix.as_deref(),
            input.first_name.as_deref().unwrap_or_default(),
            input.middle_name.as_deref(),
            input.last_name.as_deref(),
            input.suffix.as_deref(),
        ),
    };
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Contributor name is required".into(),
        )));
    }
    if input.role.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Contributor role is required".into(),
        )));
    }

    let contributor = ContributorRepo::create(&state.pool, id, &name, &input).await?;
    Ok((StatusCode::CREATED, Json(contributor)))
}

/// DELETE /api/v1/books/{id}/contributors/{contributor_id}
pub async fn delete_contributor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, contributor_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    find_owned(&state, auth.user_id, id).await?;
    if ContributorRepo::delete(&state.pool, id, contributor_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Contributor", contributor_id))
    }
}
