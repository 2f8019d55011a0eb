//! Filtered Royalties Estimator rows.

use kdpdesk_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `kdp_royalties_estimator_data` table.
///
/// Inserts come from `kdpdesk_core::kdp::estimator::EstimatorRecord` plus
/// the USD royalty computed at import time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EstimatorData {
    pub id: DbId,
    pub import_id: DbId,
    pub user_id: DbId,
    pub sheet_name: String,
    pub row_index: i32,
    pub royalty_date: Option<Date>,
    pub order_date: Option<Date>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub asin: Option<String>,
    pub isbn: Option<String>,
    pub marketplace: Option<String>,
    pub royalty_type: Option<String>,
    pub transaction_type: Option<String>,
    pub units_sold: Option<i32>,
    pub units_refunded: Option<i32>,
    pub net_units_sold: Option<i32>,
    pub avg_list_price: Option<f64>,
    pub avg_offer_price: Option<f64>,
    pub avg_delivery_manufacturing_cost: Option<f64>,
    pub avg_file_size_mb: Option<f64>,
    pub avg_delivery_cost: Option<f64>,
    pub printing_cost: Option<f64>,
    pub expanded_distribution_cost: Option<f64>,
    pub royalty: Option<f64>,
    pub currency: Option<String>,
    pub royalty_usd: Option<f64>,
    pub kenp_read: Option<i32>,
    pub paid_units: Option<i32>,
    pub free_units: Option<i32>,
    pub raw_data: serde_json::Value,
    pub created_at: Timestamp,
}

/// Per sheet and transaction type totals for one import.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EstimatorBucket {
    pub sheet_name: String,
    pub transaction_type: Option<String>,
    pub record_count: i64,
    pub total_royalty_usd: f64,
}
