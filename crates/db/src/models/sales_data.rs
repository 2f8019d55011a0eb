//! Simple sales rows and dashboard aggregates.

use kdpdesk_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sales_data` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SalesData {
    pub id: DbId,
    pub user_id: DbId,
    pub project_id: Option<DbId>,
    pub book_id: Option<DbId>,
    pub report_date: Date,
    pub format: String,
    pub marketplace: String,
    pub units_sold: i32,
    pub revenue: f64,
    pub royalty: f64,
    pub file_name: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a parsed sales report row.
#[derive(Debug, Clone)]
pub struct CreateSalesData {
    pub project_id: Option<DbId>,
    pub book_id: Option<DbId>,
    pub report_date: Date,
    pub format: String,
    pub marketplace: String,
    pub units_sold: i32,
    pub revenue: f64,
    pub royalty: f64,
    pub file_name: Option<String>,
}

/// Revenue for one calendar month.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`.
    pub month: String,
    pub revenue: f64,
}

/// Units sold per format.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormatUnits {
    pub format: String,
    pub units: i64,
}
