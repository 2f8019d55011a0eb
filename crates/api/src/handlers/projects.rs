//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use kdpdesk_core::types::DbId;
use kdpdesk_core::validation::{validate_project_status, validate_title};
use kdpdesk_db::models::project::{CreateProject, Project, ProjectWithStats, UpdateProject};
use kdpdesk_db::repositories::ProjectRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query for `DELETE /projects/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteProjectParams {
    /// Delete the project's books too; otherwise they are unlinked.
    #[serde(default)]
    pub delete_books: bool,
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    validate_title(&input.title)?;
    if let Some(status) = &input.status {
        validate_project_status(status)?;
    }
    let project = ProjectRepo::create(&state.pool, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ProjectWithStats>>>> {
    let projects = ProjectRepo::list_with_stats(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ProjectWithStats>> {
    let project = ProjectRepo::find_with_stats(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Project", id))?;
    Ok(Json(project))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<Project>> {
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    if let Some(status) = &input.status {
        validate_project_status(status)?;
    }
    let project = ProjectRepo::update(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Project", id))?;
    Ok(Json(project))
}

/// DELETE /api/v1/projects/{id}?delete_books=true
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<DeleteProjectParams>,
) -> AppResult<StatusCode> {
    if ProjectRepo::delete(&state.pool, auth.user_id, id, params.delete_books).await? {
        tracing::info!(project_id = id, delete_books = params.delete_books, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Project", id))
    }
}

/// POST /api/v1/projects/{id}/duplicate
pub async fn duplicate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let copy = ProjectRepo::duplicate(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Project", id))?;
    Ok((StatusCode::CREATED, Json(copy)))
}
