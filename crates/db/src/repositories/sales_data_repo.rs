//! Repository for the `sales_data` table and the dashboard figures built on it.

use kdpdesk_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::sales_data::{CreateSalesData, FormatUnits, MonthlyRevenue, SalesData};

const COLUMNS: &str = "id, user_id, project_id, book_id, report_date, format, marketplace, \
                        units_sold, revenue, royalty, file_name, created_at";

pub struct SalesDataRepo;

impl SalesDataRepo {
    /// Insert a parsed report in one transaction. Returns the number of rows.
    pub async fn insert_batch(
        pool: &PgPool,
        user_id: DbId,
        rows: &[CreateSalesData],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO sales_data (user_id, project_id, book_id, report_date, format,
                                         marketplace, units_sold, revenue, royalty, file_name)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(user_id)
            .bind(row.project_id)
            .bind(row.book_id)
            .bind(row.report_date)
            .bind(&row.format)
            .bind(&row.marketplace)
            .bind(row.units_sold)
            .bind(row.revenue)
            .bind(row.royalty)
            .bind(&row.file_name)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    /// The user's sales rows within an optional inclusive date range, newest first.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Vec<SalesData>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sales_data
             WHERE user_id = $1
               AND ($2::DATE IS NULL OR report_date >= $2)
               AND ($3::DATE IS NULL OR report_date <= $3)
             ORDER BY report_date DESC, id DESC"
        );
        sqlx::query_as::<_, SalesData>(&query)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Revenue reported on or after `since`.
    pub async fn revenue_since(
        pool: &PgPool,
        user_id: DbId,
        since: Date,
    ) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(revenue), 0)::DOUBLE PRECISION FROM sales_data
             WHERE user_id = $1 AND report_date >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    pub async fn total_units(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(units_sold), 0)::BIGINT FROM sales_data WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Revenue per month from `since`, oldest first.
    pub async fn monthly_revenue(
        pool: &PgPool,
        user_id: DbId,
        since: Date,
    ) -> Result<Vec<MonthlyRevenue>, sqlx::Error> {
        sqlx::query_as::<_, MonthlyRevenue>(
            "SELECT to_char(report_date, 'YYYY-MM') AS month,
                    COALESCE(SUM(revenue), 0)::DOUBLE PRECISION AS revenue
             FROM sales_data
             WHERE user_id = $1 AND report_date >= $2
             GROUP BY 1
             ORDER BY 1",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    pub async fn units_by_format(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<FormatUnits>, sqlx::Error> {
        sqlx::query_as::<_, FormatUnits>(
            "SELECT format, COALESCE(SUM(units_sold), 0)::BIGINT AS units
             FROM sales_data WHERE user_id = $1
             GROUP BY format
             ORDER BY format",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Revenue across all users, for the admin overview.
    pub async fn total_revenue_all(pool: &PgPool) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar("SELECT COALESCE(SUM(revenue), 0)::DOUBLE PRECISION FROM sales_data")
            .fetch_one(pool)
            .await
    }
}
