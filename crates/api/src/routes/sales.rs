//! Route definitions for the simple sales report.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sales;
use crate::state::AppState;

/// Routes mounted at `/sales-data`.
///
/// ```text
/// GET /  -> list (?start_date=&end_date=)
/// ```
pub fn sales_data_router() -> Router<AppState> {
    Router::new().route("/", get(sales::list))
}

/// Routes mounted at `/kdp-reports`.
///
/// ```text
/// POST /upload  -> upload_report (multipart `file`)
/// ```
pub fn reports_router() -> Router<AppState> {
    Router::new().route("/upload", post(sales::upload_report))
}
