//! Liveness and readiness probe.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use kdpdesk_core::types::Date;
use kdpdesk_db::repositories::ExchangeRateRepo;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok`, or `degraded` when Postgres does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
    /// Day of the newest stored exchange rates, if any.
    pub rates_as_of: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    pub latency_ms: u128,
}

/// GET /health
///
/// 200 when the database answers, 503 otherwise. The body has the same
/// shape either way.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let started = Instant::now();
    let reachable = kdpdesk_db::health_check(&state.pool).await.is_ok();
    let latency_ms = started.elapsed().as_millis();

    let rates_as_of = if reachable {
        ExchangeRateRepo::latest_date(&state.pool).await.ok().flatten()
    } else {
        None
    };

    let status = if reachable {
        StatusCode::OK
    } else {
        tracing::warn!("Health check: database unreachable");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthReport {
            status: if reachable { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database: DatabaseHealth {
                reachable,
                latency_ms,
            },
            rates_as_of,
        }),
    )
}

/// ```text
/// GET /health
/// ```
///
/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
