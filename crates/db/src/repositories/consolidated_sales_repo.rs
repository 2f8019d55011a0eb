//! Repository for the `consolidated_sales` table.

use kdpdesk_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::consolidated_sales::{ConsolidatedSales, UpsertConsolidatedSales};

const COLUMNS: &str = "id, user_id, currency, marketplace, period_start, period_end, \
                        total_earnings, total_earnings_usd, exchange_rate, payment_count, \
                        source_imports, created_at, updated_at";

pub struct ConsolidatedSalesRepo;

impl ConsolidatedSalesRepo {
    /// Insert or replace the totals for (user, currency, marketplace).
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        input: &UpsertConsolidatedSales,
    ) -> Result<ConsolidatedSales, sqlx::Error> {
        let query = format!(
            "INSERT INTO consolidated_sales (
                user_id, currency, marketplace, period_start, period_end, total_earnings,
                total_earnings_usd, exchange_rate, payment_count, source_imports)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT ON CONSTRAINT uq_consolidated_sales_user_currency_marketplace
             DO UPDATE SET
                period_start = EXCLUDED.period_start,
                period_end = EXCLUDED.period_end,
                total_earnings = EXCLUDED.total_earnings,
                total_earnings_usd = EXCLUDED.total_earnings_usd,
                exchange_rate = EXCLUDED.exchange_rate,
                payment_count = EXCLUDED.payment_count,
                source_imports = EXCLUDED.source_imports
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ConsolidatedSales>(&query)
            .bind(user_id)
            .bind(&input.currency)
            .bind(&input.marketplace)
            .bind(input.period_start)
            .bind(input.period_end)
            .bind(input.total_earnings)
            .bind(input.total_earnings_usd)
            .bind(input.exchange_rate)
            .bind(input.payment_count)
            .bind(&input.source_imports)
            .fetch_one(executor)
            .await
    }

    /// Replace all of the user's rows with `rows` in one transaction, so
    /// groups whose payments are gone disappear.
    pub async fn replace_for_user(
        pool: &PgPool,
        user_id: DbId,
        rows: &[UpsertConsolidatedSales],
    ) -> Result<Vec<ConsolidatedSales>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM consolidated_sales WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(rows.len());
        for input in rows {
            stored.push(Self::upsert(&mut *tx, user_id, input).await?);
        }
        tx.commit().await?;
        Ok(stored)
    }

    /// The user's consolidated rows, largest USD total first.
    pub async fn list(pool: &PgPool, user_id: DbId) -> Result<Vec<ConsolidatedSales>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM consolidated_sales
             WHERE user_id = $1
             ORDER BY total_earnings_usd DESC, currency, marketplace"
        );
        sqlx::query_as::<_, ConsolidatedSales>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Sum of USD totals across the user's consolidated rows.
    pub async fn total_usd(pool: &PgPool, user_id: DbId) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_earnings_usd), 0)::DOUBLE PRECISION
             FROM consolidated_sales WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
