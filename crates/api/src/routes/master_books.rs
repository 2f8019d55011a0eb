//! Route definitions for the `/master-books` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::master_books;
use crate::state::AppState;

/// Routes mounted at `/master-books`.
///
/// ```text
/// GET  /                     -> list
/// GET  /{asin}               -> get_by_asin
/// POST /update/{import_id}   -> update_from
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(master_books::list))
        .route("/{asin}", get(master_books::get_by_asin))
        .route("/update/{import_id}", post(master_books::update_from))
}
