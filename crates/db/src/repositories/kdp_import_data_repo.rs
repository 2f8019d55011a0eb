//! Repository for the `kdp_import_data` table and the analytics queries
//! that read it.

use std::collections::HashSet;

use kdpdesk_core::kdp::aggregation::UNKNOWN_CURRENCY;
use kdpdesk_core::kdp::dedup::build_key;
use kdpdesk_core::kdp::detection::KdpFileType;
use kdpdesk_core::kdp::record::NormalizedRecord;
use kdpdesk_core::types::{Date, DbId};
use sqlx::{FromRow, PgPool};

use crate::models::kdp_import_data::{
    BookPerformance, CurrencyTotal, ImportDataOverview, KdpImportData, MarketplacePerformance,
    MonthlyTrend, PaymentGroup,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, import_id, user_id, sheet_name, row_index, asin, isbn, title, \
                        author_name, marketplace, sales_date, format, units_sold, units_refunded, \
                        net_units_sold, paid_units, free_units, kenp_read, currency, list_price, \
                        offer_price, royalty, royalty_type, transaction_type, payment_status, \
                        file_size, delivery_cost, manufacturing_cost, raw_data, extra_fields, \
                        is_duplicate, matched_book_id, created_at";

/// The stored columns that make up a duplicate key, in key order.
#[derive(Debug, FromRow)]
struct KeyParts {
    asin: Option<String>,
    isbn: Option<String>,
    title: Option<String>,
    marketplace: Option<String>,
    format: Option<String>,
    sales_date: Option<Date>,
    royalty: Option<f64>,
    currency: Option<String>,
}

impl KeyParts {
    fn key(&self) -> Option<String> {
        let sales_date = self.sales_date.map(|d| d.to_string());
        let royalty = self.royalty.map(|r| r.to_string());
        build_key([
            self.asin.as_deref(),
            self.isbn.as_deref(),
            self.title.as_deref(),
            self.marketplace.as_deref(),
            self.format.as_deref(),
            sales_date.as_deref(),
            royalty.as_deref(),
            self.currency.as_deref(),
        ])
    }
}

pub struct KdpImportDataRepo;

impl KdpImportDataRepo {
    /// Insert an import's records in one transaction. Returns the row count.
    pub async fn insert_batch(
        pool: &PgPool,
        import_id: DbId,
        user_id: DbId,
        records: &[NormalizedRecord],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        for rec in records {
            sqlx::query(
                "INSERT INTO kdp_import_data (
                    import_id, user_id, sheet_name, row_index, asin, isbn, title, author_name,
                    marketplace, sales_date, format, units_sold, units_refunded, net_units_sold,
                    paid_units, free_units, kenp_read, currency, list_price, offer_price,
                    royalty, royalty_type, transaction_type, payment_status, file_size,
                    delivery_cost, manufacturing_cost, raw_data, extra_fields)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                         $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29)",
            )
            .bind(import_id)
            .bind(user_id)
            .bind(&rec.sheet_name)
            .bind(rec.row_index)
            .bind(&rec.asin)
            .bind(&rec.isbn)
            .bind(&rec.title)
            .bind(&rec.author_name)
            .bind(&rec.marketplace)
            .bind(rec.sales_date)
            .bind(rec.format.map(|f| f.as_str()))
            .bind(rec.units_sold)
            .bind(rec.units_refunded)
            .bind(rec.net_units_sold)
            .bind(rec.paid_units)
            .bind(rec.free_units)
            .bind(rec.kenp_read)
            .bind(&rec.currency)
            .bind(rec.list_price)
            .bind(rec.offer_price)
            .bind(rec.royalty)
            .bind(&rec.royalty_type)
            .bind(&rec.transaction_type)
            .bind(&rec.payment_status)
            .bind(rec.file_size)
            .bind(rec.delivery_cost)
            .bind(rec.manufacturing_cost)
            .bind(serde_json::Value::Object(rec.raw_data.clone()))
            .bind(serde_json::Value::Object(rec.extra_fields.clone()))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }

    /// One page of an import's rows in sheet order.
    pub async fn list_by_import(
        pool: &PgPool,
        user_id: DbId,
        import_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KdpImportData>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kdp_import_data
             WHERE import_id = $1 AND user_id = $2
             ORDER BY id
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, KdpImportData>(&query)
            .bind(import_id)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every non-duplicate row of an import.
    pub async fn list_all_by_import(
        pool: &PgPool,
        user_id: DbId,
        import_id: DbId,
    ) -> Result<Vec<KdpImportData>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kdp_import_data
             WHERE import_id = $1 AND user_id = $2 AND is_duplicate = false
             ORDER BY id"
        );
        sqlx::query_as::<_, KdpImportData>(&query)
            .bind(import_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_import(
        pool: &PgPool,
        user_id: DbId,
        import_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM kdp_import_data WHERE import_id = $1 AND user_id = $2",
        )
        .bind(import_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// The user's non-duplicate rows in an optional inclusive date range,
    /// newest first, capped at `limit`.
    pub async fn list_for_user_non_duplicate(
        pool: &PgPool,
        user_id: DbId,
        start: Option<Date>,
        end: Option<Date>,
        limit: i64,
    ) -> Result<Vec<KdpImportData>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kdp_import_data
             WHERE user_id = $1 AND is_duplicate = false
               AND ($2::DATE IS NULL OR sales_date >= $2)
               AND ($3::DATE IS NULL OR sales_date <= $3)
             ORDER BY sales_date DESC NULLS LAST, id DESC
             LIMIT $4"
        );
        sqlx::query_as::<_, KdpImportData>(&query)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Duplicate keys of every row already stored for the user.
    pub async fn duplicate_keys_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<HashSet<String>, sqlx::Error> {
        let rows = sqlx::query_as::<_, KeyParts>(
            "SELECT asin, isbn, title, marketplace, format, sales_date, royalty, currency
             FROM kdp_import_data WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.iter().filter_map(KeyParts::key).collect())
    }

    /// Point an import's rows for one identifier at a catalogue book.
    pub async fn set_matched_book(
        pool: &PgPool,
        user_id: DbId,
        import_id: DbId,
        identifier: &str,
        book_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE kdp_import_data SET matched_book_id = $4
             WHERE import_id = $1 AND user_id = $2
               AND (asin = $3 OR (asin IS NULL AND isbn = $3))",
        )
        .bind(import_id)
        .bind(user_id)
        .bind(identifier)
        .bind(book_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Analytics
    // -----------------------------------------------------------------------

    pub async fn overview(pool: &PgPool, user_id: DbId) -> Result<ImportDataOverview, sqlx::Error> {
        sqlx::query_as::<_, ImportDataOverview>(
            "SELECT COUNT(*) AS total_records,
                    COUNT(DISTINCT COALESCE(asin, isbn)) AS unique_books,
                    COALESCE(SUM(units_sold), 0)::BIGINT AS total_units_sold,
                    COALESCE(SUM(kenp_read), 0)::BIGINT AS total_kenp_read,
                    COUNT(DISTINCT marketplace) AS marketplaces,
                    MIN(sales_date) AS first_sale_date,
                    MAX(sales_date) AS last_sale_date
             FROM kdp_import_data
             WHERE user_id = $1 AND is_duplicate = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Royalty totals per currency. Rows without a currency are grouped
    /// under `UNKNOWN`.
    pub async fn currency_totals(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<CurrencyTotal>, sqlx::Error> {
        sqlx::query_as::<_, CurrencyTotal>(
            "SELECT COALESCE(currency, $2) AS currency,
                    COALESCE(SUM(royalty), 0)::DOUBLE PRECISION AS total_royalty,
                    COUNT(*) AS record_count
             FROM kdp_import_data
             WHERE user_id = $1 AND is_duplicate = false
             GROUP BY 1
             ORDER BY 1",
        )
        .bind(user_id)
        .bind(UNKNOWN_CURRENCY)
        .fetch_all(pool)
        .await
    }

    /// Per book and currency totals. Ranking across currencies happens in
    /// the caller once amounts are converted.
    pub async fn book_performance(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<BookPerformance>, sqlx::Error> {
        sqlx::query_as::<_, BookPerformance>(
            "SELECT asin, isbn, MAX(title) AS title,
                    COALESCE(currency, $2) AS currency,
                    COALESCE(SUM(units_sold), 0)::BIGINT AS units_sold,
                    COALESCE(SUM(kenp_read), 0)::BIGINT AS kenp_read,
                    COALESCE(SUM(royalty), 0)::DOUBLE PRECISION AS total_royalty
             FROM kdp_import_data
             WHERE user_id = $1 AND is_duplicate = false
               AND (asin IS NOT NULL OR isbn IS NOT NULL)
             GROUP BY asin, isbn, 4",
        )
        .bind(user_id)
        .bind(UNKNOWN_CURRENCY)
        .fetch_all(pool)
        .await
    }

    pub async fn marketplace_performance(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<MarketplacePerformance>, sqlx::Error> {
        sqlx::query_as::<_, MarketplacePerformance>(
            "SELECT COALESCE(marketplace, 'Unknown') AS marketplace,
                    COALESCE(currency, $2) AS currency,
                    COALESCE(SUM(units_sold), 0)::BIGINT AS units_sold,
                    COALESCE(SUM(royalty), 0)::DOUBLE PRECISION AS total_royalty,
                    COUNT(*) AS record_count
             FROM kdp_import_data
             WHERE user_id = $1 AND is_duplicate = false
             GROUP BY 1, 2
             ORDER BY 1, 2",
        )
        .bind(user_id)
        .bind(UNKNOWN_CURRENCY)
        .fetch_all(pool)
        .await
    }

    /// Monthly totals from `since` (all time when `None`), oldest first.
    pub async fn monthly_trends(
        pool: &PgPool,
        user_id: DbId,
        since: Option<Date>,
    ) -> Result<Vec<MonthlyTrend>, sqlx::Error> {
        sqlx::query_as::<_, MonthlyTrend>(
            "SELECT to_char(sales_date, 'YYYY-MM') AS month,
                    COALESCE(currency, $3) AS currency,
                    COALESCE(SUM(units_sold), 0)::BIGINT AS units_sold,
                    COALESCE(SUM(kenp_read), 0)::BIGINT AS kenp_read,
                    COALESCE(SUM(royalty), 0)::DOUBLE PRECISION AS total_royalty
             FROM kdp_import_data
             WHERE user_id = $1 AND is_duplicate = false AND sales_date IS NOT NULL
               AND ($2::DATE IS NULL OR sales_date >= $2)
             GROUP BY 1, 2
             ORDER BY 1, 2",
        )
        .bind(user_id)
        .bind(since)
        .bind(UNKNOWN_CURRENCY)
        .fetch_all(pool)
        .await
    }

    /// Positive-royalty rows of completed payments imports, grouped by
    /// currency and marketplace.
    pub async fn payment_groups(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PaymentGroup>, sqlx::Error> {
        sqlx::query_as::<_, PaymentGroup>(
            "SELECT d.currency, d.marketplace,
                    SUM(d.royalty)::DOUBLE PRECISION AS total_earnings,
                    COUNT(*) AS payment_count,
                    MIN(d.sales_date) AS period_start,
                    MAX(d.sales_date) AS period_end,
                    array_agg(DISTINCT d.import_id ORDER BY d.import_id) AS import_ids
             FROM kdp_import_data d
             JOIN kdp_imports i ON i.id = d.import_id
             WHERE d.user_id = $1 AND i.detected_type = $2
               AND d.is_duplicate = false AND d.royalty > 0
               AND d.currency IS NOT NULL AND d.marketplace IS NOT NULL
             GROUP BY d.currency, d.marketplace
             ORDER BY d.currency, d.marketplace",
        )
        .bind(user_id)
        .bind(KdpFileType::Payments.as_str())
        .fetch_all(pool)
        .await
    }

    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM kdp_import_data")
            .fetch_one(pool)
            .await
    }
}
