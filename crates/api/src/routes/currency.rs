//! Route definitions for exchange rates and the currency list.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::currency;
use crate::state::AppState;

/// Routes mounted at `/exchange-rates`.
///
/// ```text
/// GET  /         -> list_rates
/// GET  /convert  -> convert (?amount=&from=&to=)
/// POST /update   -> update_rates (admin only)
/// ```
pub fn exchange_rates_router() -> Router<AppState> {
    Router::new()
        .route("/", get(currency::list_rates))
        .route("/convert", get(currency::convert))
        .route("/update", post(currency::update_rates))
}

/// Routes mounted at `/currencies`.
pub fn currencies_router() -> Router<AppState> {
    Router::new().route("/", get(currency::list_currencies))
}
