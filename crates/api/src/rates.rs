//! Exchange-rate provider client and the refresh routine shared by the
//! admin endpoint and the background task.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use kdpdesk_core::currency::{RateTable, BASE_CURRENCY};
use kdpdesk_db::repositories::ExchangeRateRepo;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

pub const SOURCE_API: &str = "api";
pub const SOURCE_FALLBACK: &str = "fallback";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum RateFetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Rate provider returned status {0}")]
    Status(u16),

    #[error("Rate provider response has no usable rates")]
    Empty,
}

/// A source of "units per 1 USD" rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_usd_rates(&self) -> Result<RateTable, RateFetchError>;
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: Option<BTreeMap<String, f64>>,
}

/// Client for exchangerate-api style endpoints: `GET {base_url}/USD`
/// answering `{ "rates": { "EUR": 0.95, ... } }`.
pub struct HttpRateProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_usd_rates(&self) -> Result<RateTable, RateFetchError> {
        let url = format!("{}/{BASE_CURRENCY}", self.base_url);
        tracing::debug!(%url, "Fetching exchange rates");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(RateFetchError::Status(response.status().as_u16()));
        }

        let body: LatestRatesResponse = response.json().await?;
        let rates = body.rates.filter(|r| !r.is_empty()).ok_or(RateFetchError::Empty)?;
        Ok(rates.iter().map(|(code, rate)| (code.as_str(), *rate)).collect())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub stored: u64,
    /// `api` or `fallback`.
    pub source: &'static str,
}

/// Fetch today's rates (falling back to the built-in table on any provider
/// failure) and store them.
pub async fn refresh_rates(
    pool: &PgPool,
    provider: &dyn RateProvider,
) -> Result<RefreshOutcome, sqlx::Error> {
    let (table, source) = match provider.fetch_usd_rates().await {
        Ok(table) => (table, SOURCE_API),
        Err(e) => {
            tracing::warn!(error = %e, "Exchange-rate provider failed, using fallback rates");
            (RateTable::fallback(), SOURCE_FALLBACK)
        }
    };

    let today = Utc::now().date_naive();
    let stored = ExchangeRateRepo::upsert_usd_table(pool, &table, today, source).await?;
    tracing::info!(stored, source, "Exchange rates updated");
    Ok(RefreshOutcome { stored, source })
}

/// Latest stored rates with gaps filled from the fallback table.
pub async fn current_rate_table(pool: &PgPool) -> Result<RateTable, sqlx::Error> {
    let mut table = ExchangeRateRepo::latest_rate_table(pool).await?;
    table.fill_from(&RateTable::fallback());
    Ok(table)
}
