use std::sync::Arc;

use tokio_util::task::TaskTracker;

use crate::config::ServerConfig;
use crate::rates::RateProvider;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is a pool handle or behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: kdpdesk_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Source for live exchange rates (admin refresh and the background task).
    pub rate_provider: Arc<dyn RateProvider>,
    /// Background import runs, awaited during shutdown.
    pub import_tasks: TaskTracker,
}
