//! Periodic exchange-rate refresh.
//!
//! The first tick fires immediately, so rates are stored at startup and
//! then every `interval` after. A restart on a day that already has stored
//! rates skips the startup fetch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kdpdesk_db::repositories::ExchangeRateRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::rates::{refresh_rates, RateProvider};

pub async fn run(
    pool: PgPool,
    provider: Arc<dyn RateProvider>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Exchange-rate refresh started");

    let mut ticker = tokio::time::interval(interval);
    let mut first = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Exchange-rate refresh stopping");
                break;
            }
            _ = ticker.tick() => {
                if std::mem::take(&mut first) && has_rates_for_today(&pool).await {
                    tracing::debug!("Exchange rates already stored today, skipping startup fetch");
                    continue;
                }
                if let Err(e) = refresh_rates(&pool, provider.as_ref()).await {
                    tracing::error!(error = %e, "Exchange-rate refresh: failed to store rates");
                }
            }
        }
    }
}

async fn has_rates_for_today(pool: &PgPool) -> bool {
    match ExchangeRateRepo::latest_date(pool).await {
        Ok(latest) => latest == Some(Utc::now().date_naive()),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read latest exchange-rate date");
            false
        }
    }
}
