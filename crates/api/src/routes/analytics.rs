//! Route definitions for `/analytics`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::analytics;
use crate::state::AppState;

/// Routes mounted at `/analytics`.
///
/// ```text
/// GET  /overview               -> overview
/// GET  /total-revenue          -> total_revenue
/// GET  /top-performers         -> top_performers (?limit=)
/// GET  /marketplace-breakdown  -> marketplace_breakdown
/// GET  /sales-trends           -> sales_trends (?months=)
/// GET  /detailed               -> detailed (?start_date=&end_date=&limit=)
/// POST /consolidate            -> consolidate
/// GET  /consolidated           -> consolidated
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(analytics::overview))
        .route("/total-revenue", get(analytics::total_revenue))
        .route("/top-performers", get(analytics::top_performers))
        .route("/marketplace-breakdown", get(analytics::marketplace_breakdown))
        .route("/sales-trends", get(analytics::sales_trends))
        .route("/detailed", get(analytics::detailed))
        .route("/consolidate", post(analytics::consolidate))
        .route("/consolidated", get(analytics::consolidated))
}
