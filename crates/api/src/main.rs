use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use kdpdesk_api::background;
use kdpdesk_api::config::ServerConfig;
use kdpdesk_api::engine::kdp_import;
use kdpdesk_api::rates::{HttpRateProvider, RateProvider};
use kdpdesk_api::router::build_app_router;
use kdpdesk_api::state::AppState;

const DEFAULT_LOG_FILTER: &str = "kdpdesk_api=debug,kdpdesk_db=info,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "Configuration loaded");

    let pool = connect_database().await;
    kdp_import::recover_interrupted(&pool)
        .await
        .expect("Cannot recover interrupted imports");

    let rate_provider: Arc<dyn RateProvider> =
        Arc::new(HttpRateProvider::new(config.exchange_rate_api_url.clone()));
    let tasks = BackgroundTasks::spawn(&pool, &rate_provider, &config);
    let import_tasks = TaskTracker::new();

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        rate_provider,
        import_tasks: import_tasks.clone(),
    };
    let app = build_app_router(state, &config);

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Cannot bind {addr}: {e}"));
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    drain_imports(import_tasks, grace).await;
    tasks.stop(grace).await;
    tracing::info!("Shutdown complete");
}

/// Let running imports finish within `grace`. Any still running are cut off
/// and failed by the next startup.
async fn drain_imports(tracker: TaskTracker, grace: Duration) {
    tracker.close();
    if tracker.is_empty() {
        return;
    }
    tracing::info!(running = tracker.len(), "Waiting for imports to finish");
    if tokio::time::timeout(grace, tracker.wait()).await.is_err() {
        tracing::warn!(running = tracker.len(), ?grace, "Imports still running at shutdown deadline");
    }
}

/// `RUST_LOG` picks the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Connect, ping and migrate. Any failure aborts startup.
async fn connect_database() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = kdpdesk_db::create_pool(&url)
        .await
        .expect("Cannot connect to the database");
    kdpdesk_db::health_check(&pool)
        .await
        .expect("Database did not answer the health query");
    kdpdesk_db::run_migrations(&pool)
        .await
        .expect("Database migrations failed");
    tracing::info!("Database ready");
    pool
}

/// Exchange-rate refresh and session purge, stopped together.
struct BackgroundTasks {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    fn spawn(pool: &PgPool, rates: &Arc<dyn RateProvider>, config: &ServerConfig) -> Self {
        let cancel = CancellationToken::new();
        let handles = vec![
            tokio::spawn(background::exchange_rates::run(
                pool.clone(),
                Arc::clone(rates),
                Duration::from_secs(config.exchange_rate_refresh_hours * 3600),
                cancel.clone(),
            )),
            tokio::spawn(background::session_cleanup::run(pool.clone(), cancel.clone())),
        ];
        tracing::info!(tasks = handles.len(), "Background tasks started");
        Self { cancel, handles }
    }

    async fn stop(self, grace: Duration) {
        self.cancel.cancel();
        let joined = tokio::time::timeout(grace, async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Background task panicked");
                }
            }
        })
        .await;
        if joined.is_err() {
            tracing::warn!(?grace, "Background tasks still running at shutdown deadline");
        }
    }
}

/// Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Cannot listen for Ctrl-C");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Cannot listen for SIGTERM")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("Shutdown signal received, draining connections");
}
