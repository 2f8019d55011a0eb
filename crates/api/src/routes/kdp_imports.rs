//! Route definitions for the `/kdp-imports` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::kdp_imports;
use crate::state::AppState;

/// Routes mounted at `/kdp-imports`.
///
/// ```text
/// POST   /upload                -> upload (multipart `file`, 202)
/// GET    /                      -> list (?limit=&offset=)
/// GET    /{id}                  -> get_by_id
/// DELETE /{id}                  -> delete
/// GET    /{id}/data             -> list_data (?limit=&offset=)
/// GET    /{id}/preview          -> preview
/// POST   /{id}/create-books     -> create_books
/// GET    /{id}/estimator-stats  -> estimator_stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(kdp_imports::upload))
        .route("/", get(kdp_imports::list))
        .route(
            "/{id}",
            get(kdp_imports::get_by_id).delete(kdp_imports::delete),
        )
        .route("/{id}/data", get(kdp_imports::list_data))
        .route("/{id}/preview", get(kdp_imports::preview))
        .route("/{id}/create-books", post(kdp_imports::create_books))
        .route("/{id}/estimator-stats", get(kdp_imports::estimator_stats))
}
