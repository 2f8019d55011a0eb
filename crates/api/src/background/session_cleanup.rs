//! Periodic purge of dead refresh-token sessions.
//!
//! Expired sessions go at once. Revoked ones are kept for
//! [`REVOKED_SESSION_RETENTION_DAYS`] so reuse of a rotated token can still
//! be traced to its session.

use std::time::Duration;

use kdpdesk_db::repositories::SessionRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

pub const REVOKED_SESSION_RETENTION_DAYS: i32 = 7;

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(PURGE_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => purge_once(&pool).await,
        }
    }
    tracing::info!("Session purge task stopped");
}

async fn purge_once(pool: &PgPool) {
    match SessionRepo::purge(pool, REVOKED_SESSION_RETENTION_DAYS).await {
        Ok(0) => tracing::debug!("No sessions to purge"),
        Ok(deleted) => tracing::info!(deleted, "Purged dead sessions"),
        Err(e) => tracing::error!(error = %e, "Session purge failed"),
    }
}
