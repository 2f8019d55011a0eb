//! Route definitions for `/dashboard`.

use axum::routing::get;
use axum::Router;

use crate::handlers::dashboard;
use crate::state::AppState;

/// Routes mounted at `/dashboard`.
///
/// ```text
/// GET /stats  -> stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(dashboard::stats))
}
