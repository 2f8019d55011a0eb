//! Repository for the `master_books` table.

use kdpdesk_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::master_book::{MasterBook, UpsertMasterBook};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, asin, format, isbn, title, author_name, total_units_sold, \
                        total_units_refunded, net_units_sold, total_kenp_read, \
                        total_royalties_usd, royalties_by_currency, marketplace_breakdown, \
                        sales_breakdown, first_sale_date, last_sale_date, current_list_price, \
                        current_offer_price, current_currency, source_imports, last_import_id, \
                        created_at, updated_at";

pub struct MasterBookRepo;

impl MasterBookRepo {
    /// Serialize merges into one (user, ASIN, format) until the surrounding
    /// transaction ends. Covers books that do not exist yet, which a row
    /// lock cannot.
    pub async fn lock_asin_format<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        asin: &str,
        format: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("master_book:{user_id}:{asin}:{format}"))
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn find_by_asin_format<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        asin: &str,
        format: &str,
    ) -> Result<Option<MasterBook>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM master_books
             WHERE user_id = $1 AND asin = $2 AND format = $3"
        );
        sqlx::query_as::<_, MasterBook>(&query)
            .bind(user_id)
            .bind(asin)
            .bind(format)
            .fetch_optional(executor)
            .await
    }

    /// Every format of one ASIN.
    pub async fn find_by_asin(
        pool: &PgPool,
        user_id: DbId,
        asin: &str,
    ) -> Result<Vec<MasterBook>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM master_books
             WHERE user_id = $1 AND asin = $2
             ORDER BY format"
        );
        sqlx::query_as::<_, MasterBook>(&query)
            .bind(user_id)
            .bind(asin)
            .fetch_all(pool)
            .await
    }

    /// The user's master books, highest USD royalties first.
    pub async fn list(pool: &PgPool, user_id: DbId) -> Result<Vec<MasterBook>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM master_books
             WHERE user_id = $1
             ORDER BY total_royalties_usd DESC, asin, format"
        );
        sqlx::query_as::<_, MasterBook>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Write the full merged state for (user, ASIN, format).
    ///
    /// Identifying fields only overwrite stored values when present.
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        input: &UpsertMasterBook,
    ) -> Result<MasterBook, sqlx::Error> {
        let totals = &input.totals;
        let to_json = |v: serde_json::Result<serde_json::Value>| v.unwrap_or_default();
        let query = format!(
            "INSERT INTO master_books (
                user_id, asin, format, isbn, title, author_name, total_units_sold,
                total_units_refunded, net_units_sold, total_kenp_read, total_royalties_usd,
                royalties_by_currency, marketplace_breakdown, sales_breakdown, first_sale_date,
                last_sale_date, current_list_price, current_offer_price, current_currency,
                source_imports, last_import_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                     $18, $19, $20, $21)
             ON CONFLICT ON CONSTRAINT uq_master_books_user_asin_format DO UPDATE SET
                isbn = COALESCE(EXCLUDED.isbn, master_books.isbn),
                title = COALESCE(EXCLUDED.title, master_books.title),
                author_name = COALESCE(EXCLUDED.author_name, master_books.author_name),
                total_units_sold = EXCLUDED.total_units_sold,
                total_units_refunded = EXCLUDED.total_units_refunded,
                net_units_sold = EXCLUDED.net_units_sold,
                total_kenp_read = EXCLUDED.total_kenp_read,
                total_royalties_usd = EXCLUDED.total_royalties_usd,
                royalties_by_currency = EXCLUDED.royalties_by_currency,
                marketplace_breakdown = EXCLUDED.marketplace_breakdown,
                sales_breakdown = EXCLUDED.sales_breakdown,
                first_sale_date = EXCLUDED.first_sale_date,
                last_sale_date = EXCLUDED.last_sale_date,
                current_list_price = EXCLUDED.current_list_price,
                current_offer_price = EXCLUDED.current_offer_price,
                current_currency = EXCLUDED.current_currency,
                source_imports = EXCLUDED.source_imports,
                last_import_id = EXCLUDED.last_import_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MasterBook>(&query)
            .bind(user_id)
            .bind(&input.asin)
            .bind(&input.format)
            .bind(&input.isbn)
            .bind(&input.title)
            .bind(&input.author_name)
            .bind(totals.total_units_sold)
            .bind(totals.total_units_refunded)
            .bind(totals.net_units_sold)
            .bind(totals.total_kenp_read)
            .bind(input.total_royalties_usd)
            .bind(to_json(serde_json::to_value(&totals.royalties_by_currency)))
            .bind(to_json(serde_json::to_value(&totals.marketplace_breakdown)))
            .bind(to_json(serde_json::to_value(&totals.sales_breakdown)))
            .bind(totals.first_sale_date)
            .bind(totals.last_sale_date)
            .bind(totals.current_list_price)
            .bind(totals.current_offer_price)
            .bind(&totals.current_currency)
            .bind(&input.source_imports)
            .bind(input.last_import_id)
            .fetch_one(executor)
            .await
    }

    /// Store a re-computed USD total (after exchange rates change).
    pub async fn set_total_royalties_usd(
        pool: &PgPool,
        id: DbId,
        total: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE master_books SET total_royalties_usd = $2 WHERE id = $1")
            .bind(id)
            .bind(total)
            .execute(pool)
            .await?;
        Ok(())
    }
}
