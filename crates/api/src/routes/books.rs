//! Route definitions for the `/books` resource and its contributors.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::books;
use crate::state::AppState;

/// Routes mounted at `/books`.
///
/// ```text
/// GET    /                                     -> list
/// POST   /                                     -> create
/// GET    /check-isbn                           -> check_isbn (?isbn=&exclude_id=)
/// GET    /{id}                                 -> get_by_id
/// PUT    /{id}                                 -> update
/// DELETE /{id}                                 -> delete
/// POST   /{id}/duplicate                       -> duplicate
///
/// GET    /{id}/contributors                    -> list_contributors
/// POST   /{id}/contributors                    -> add_contributor
/// DELETE /{id}/contributors/{contributor_id}   -> delete_contributor
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(books::list).post(books::create))
        .route("/check-isbn", get(books::check_isbn))
        .route(
            "/{id}",
            get(books::get_by_id).put(books::update).delete(books::delete),
        )
        .route("/{id}/duplicate", post(books::duplicate))
        .route(
            "/{id}/contributors",
            get(books::list_contributors).post(books::add_contributor),
        )
        .route(
            "/{id}/contributors/{contributor_id}",
            delete(books::delete_contributor),
        )
}
