//! Repository for the `exchange_rates` table.

use kdpdesk_core::currency::{RateTable, BASE_CURRENCY};
use kdpdesk_core::types::Date;
use sqlx::PgPool;

use crate::models::exchange_rate::ExchangeRate;

const COLUMNS: &str =
    "id, from_currency, to_currency, rate, rate_date, source, created_at, updated_at";

pub struct ExchangeRateRepo;

impl ExchangeRateRepo {
    /// Insert or replace the rate for (from, to, date).
    pub async fn upsert_rate(
        pool: &PgPool,
        from_currency: &str,
        to_currency: &str,
        rate: f64,
        rate_date: Date,
        source: &str,
    ) -> Result<ExchangeRate, sqlx::Error> {
        let query = format!(
            "INSERT INTO exchange_rates (from_currency, to_currency, rate, rate_date, source)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_exchange_rates_pair_date DO UPDATE SET
                rate = EXCLUDED.rate,
                source = EXCLUDED.source
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ExchangeRate>(&query)
            .bind(from_currency)
            .bind(to_currency)
            .bind(rate)
            .bind(rate_date)
            .bind(source)
            .fetch_one(pool)
            .await
    }

    /// Store a whole USD-based table for one day in a transaction.
    pub async fn upsert_usd_table(
        pool: &PgPool,
        table: &RateTable,
        rate_date: Date,
        source: &str,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut stored = 0;
        for (currency, rate) in table.currencies() {
            sqlx::query(
                "INSERT INTO exchange_rates (from_currency, to_currency, rate, rate_date, source)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT ON CONSTRAINT uq_exchange_rates_pair_date DO UPDATE SET
                    rate = EXCLUDED.rate,
                    source = EXCLUDED.source",
            )
            .bind(BASE_CURRENCY)
            .bind(currency)
            .bind(rate)
            .bind(rate_date)
            .bind(source)
            .execute(&mut *tx)
            .await?;
            stored += 1;
        }
        tx.commit().await?;
        Ok(stored)
    }

    /// Most recent USD-based rate per currency.
    pub async fn latest_usd_rates(pool: &PgPool) -> Result<Vec<ExchangeRate>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT ON (to_currency) {COLUMNS} FROM exchange_rates
             WHERE from_currency = $1
             ORDER BY to_currency, rate_date DESC"
        );
        sqlx::query_as::<_, ExchangeRate>(&query)
            .bind(BASE_CURRENCY)
            .fetch_all(pool)
            .await
    }

    /// Latest stored rates as a [`RateTable`].
    pub async fn latest_rate_table(pool: &PgPool) -> Result<RateTable, sqlx::Error> {
        let rows = Self::latest_usd_rates(pool).await?;
        Ok(rows
            .iter()
            .map(|r| (r.to_currency.as_str(), r.rate))
            .collect())
    }

    /// Most recent direct rate for a pair.
    pub async fn latest_rate(
        pool: &PgPool,
        from_currency: &str,
        to_currency: &str,
    ) -> Result<Option<ExchangeRate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM exchange_rates
             WHERE from_currency = $1 AND to_currency = $2
             ORDER BY rate_date DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, ExchangeRate>(&query)
            .bind(from_currency)
            .bind(to_currency)
            .fetch_optional(pool)
            .await
    }

    /// Date of the newest stored rate, if any.
    pub async fn latest_date(pool: &PgPool) -> Result<Option<Date>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(rate_date) FROM exchange_rates")
            .fetch_one(pool)
            .await
    }
}
