//! Repository for the `kdp_royalties_estimator_data` table.

use kdpdesk_core::kdp::estimator::EstimatorRecord;
use kdpdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::estimator_data::{EstimatorBucket, EstimatorData};

const COLUMNS: &str = "id, import_id, user_id, sheet_name, row_index, royalty_date, order_date, \
                        title, author_name, asin, isbn, marketplace, royalty_type, \
                        transaction_type, units_sold, units_refunded, net_units_sold, \
                        avg_list_price, avg_offer_price, avg_delivery_manufacturing_cost, \
                        avg_file_size_mb, avg_delivery_cost, printing_cost, \
                        expanded_distribution_cost, royalty, currency, royalty_usd, kenp_read, \
                        paid_units, free_units, raw_data, created_at";

pub struct EstimatorDataRepo;

impl EstimatorDataRepo {
    /// Insert estimator records, each paired with its royalty in USD, in
    /// one transaction.
    pub async fn insert_batch(
        pool: &PgPool,
        import_id: DbId,
        user_id: DbId,
        rows: &[(EstimatorRecord, Option<f64>)],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        for (rec, royalty_usd) in rows {
            sqlx::query(
                "INSERT INTO kdp_royalties_estimator_data (
                    import_id, user_id, sheet_name, row_index, royalty_date, order_date, title,
                    author_name, asin, isbn, marketplace, royalty_type, transaction_type,
                    units_sold, units_refunded, net_units_sold, avg_list_price, avg_offer_price,
                    avg_delivery_manufacturing_cost, avg_file_size_mb, avg_delivery_cost,
                    printing_cost, expanded_distribution_cost, royalty, currency, royalty_usd,
                    kenp_read, paid_units, free_units, raw_data)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                         $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30)",
            )
            .bind(import_id)
            .bind(user_id)
            .bind(&rec.sheet_name)
            .bind(rec.row_index)
            .bind(rec.royalty_date)
            .bind(rec.order_date)
            .bind(&rec.title)
            .bind(&rec.author_name)
            .bind(&rec.asin)
            .bind(&rec.isbn)
            .bind(&rec.marketplace)
            .bind(&rec.royalty_type)
            .bind(&rec.transaction_type)
            .bind(rec.units_sold)
            .bind(rec.units_refunded)
            .bind(rec.net_units_sold)
            .bind(rec.avg_list_price)
            .bind(rec.avg_offer_price)
            .bind(rec.avg_delivery_manufacturing_cost)
            .bind(rec.avg_file_size_mb)
            .bind(rec.avg_delivery_cost)
            .bind(rec.printing_cost)
            .bind(rec.expanded_distribution_cost)
            .bind(rec.royalty)
            .bind(&rec.currency)
            .bind(*royalty_usd)
            .bind(rec.kenp_read)
            .bind(rec.paid_units)
            .bind(rec.free_units)
            .bind(&rec.raw_data)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    pub async fn list_by_import(
        pool: &PgPool,
        user_id: DbId,
        import_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EstimatorData>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kdp_royalties_estimator_data
             WHERE import_id = $1 AND user_id = $2
             ORDER BY id
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, EstimatorData>(&query)
            .bind(import_id)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn list_all_by_import(
        pool: &PgPool,
        user_id: DbId,
        import_id: DbId,
    ) -> Result<Vec<EstimatorData>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM kdp_royalties_estimator_data
             WHERE import_id = $1 AND user_id = $2
             ORDER BY id"
        );
        sqlx::query_as::<_, EstimatorData>(&query)
            .bind(import_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Record counts and USD royalty per sheet and transaction type.
    pub async fn stats(
        pool: &PgPool,
        user_id: DbId,
        import_id: DbId,
    ) -> Result<Vec<EstimatorBucket>, sqlx::Error> {
        sqlx::query_as::<_, EstimatorBucket>(
            "SELECT sheet_name, transaction_type,
                    COUNT(*) AS record_count,
                    COALESCE(SUM(royalty_usd), 0)::DOUBLE PRECISION AS total_royalty_usd
             FROM kdp_royalties_estimator_data
             WHERE import_id = $1 AND user_id = $2
             GROUP BY sheet_name, transaction_type
             ORDER BY sheet_name, transaction_type NULLS FIRST",
        )
        .bind(import_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
