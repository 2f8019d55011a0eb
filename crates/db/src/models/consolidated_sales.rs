//! Consolidated payments per currency and marketplace.

use kdpdesk_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `consolidated_sales` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConsolidatedSales {
    pub id: DbId,
    pub user_id: DbId,
    pub currency: String,
    pub marketplace: String,
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
    pub total_earnings: f64,
    pub total_earnings_usd: f64,
    pub exchange_rate: Option<f64>,
    pub payment_count: i32,
    pub source_imports: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct UpsertConsolidatedSales {
    pub currency: String,
    pub marketplace: String,
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
    pub total_earnings: f64,
    pub total_earnings_usd: f64,
    pub exchange_rate: Option<f64>,
    pub payment_count: i32,
    pub source_imports: Vec<DbId>,
}
