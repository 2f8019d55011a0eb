//! Normalized KDP rows stored per import, and the analytics read models
//! computed over them.

use std::str::FromStr;

use kdpdesk_core::format::BookFormat;
use kdpdesk_core::kdp::record::NormalizedRecord;
use kdpdesk_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `kdp_import_data` table.
///
/// Inserts go straight from [`NormalizedRecord`]; there is no create DTO.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct KdpImportData {
    pub id: DbId,
    pub import_id: DbId,
    pub user_id: DbId,
    pub sheet_name: String,
    pub row_index: i32,
    pub asin: Option<String>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub marketplace: Option<String>,
    pub sales_date: Option<Date>,
    pub format: Option<String>,
    pub units_sold: Option<i32>,
    pub units_refunded: Option<i32>,
    pub net_units_sold: Option<i32>,
    pub paid_units: Option<i32>,
    pub free_units: Option<i32>,
    pub kenp_read: Option<i32>,
    pub currency: Option<String>,
    pub list_price: Option<f64>,
    pub offer_price: Option<f64>,
    pub royalty: Option<f64>,
    pub royalty_type: Option<String>,
    pub transaction_type: Option<String>,
    pub payment_status: Option<String>,
    pub file_size: Option<f64>,
    pub delivery_cost: Option<f64>,
    pub manufacturing_cost: Option<f64>,
    pub raw_data: serde_json::Value,
    pub extra_fields: serde_json::Value,
    pub is_duplicate: bool,
    pub matched_book_id: Option<DbId>,
    pub created_at: Timestamp,
}

fn json_object(value: &serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}

impl KdpImportData {
    /// Rebuild the in-memory record this row was stored from.
    pub fn to_record(&self) -> NormalizedRecord {
        NormalizedRecord {
            sheet_name: self.sheet_name.clone(),
            row_index: self.row_index,
            asin: self.asin.clone(),
            isbn: self.isbn.clone(),
            title: self.title.clone(),
            author_name: self.author_name.clone(),
            marketplace: self.marketplace.clone(),
            sales_date: self.sales_date,
            format: self.format.as_deref().and_then(|f| BookFormat::from_str(f).ok()),
            units_sold: self.units_sold,
            units_refunded: self.units_refunded,
            net_units_sold: self.net_units_sold,
            paid_units: self.paid_units,
            free_units: self.free_units,
            kenp_read: self.kenp_read,
            currency: self.currency.clone(),
            list_price: self.list_price,
            offer_price: self.offer_price,
            royalty: self.royalty,
            royalty_type: self.royalty_type.clone(),
            transaction_type: self.transaction_type.clone(),
            payment_status: self.payment_status.clone(),
            file_size: self.file_size,
            delivery_cost: self.delivery_cost,
            manufacturing_cost: self.manufacturing_cost,
            raw_data: json_object(&self.raw_data),
            extra_fields: json_object(&self.extra_fields),
        }
    }
}

// ---------------------------------------------------------------------------
// Analytics read models
// ---------------------------------------------------------------------------

/// Royalty total in one currency.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CurrencyTotal {
    pub currency: String,
    pub total_royalty: f64,
    pub record_count: i64,
}

/// Headline counts over a user's non-duplicate import data.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImportDataOverview {
    pub total_records: i64,
    pub unique_books: i64,
    pub total_units_sold: i64,
    pub total_kenp_read: i64,
    pub marketplaces: i64,
    pub first_sale_date: Option<Date>,
    pub last_sale_date: Option<Date>,
}

/// Per-book totals in the original currency.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookPerformance {
    pub asin: Option<String>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub currency: String,
    pub units_sold: i64,
    pub kenp_read: i64,
    pub total_royalty: f64,
}

/// Per-marketplace totals in the original currency.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MarketplacePerformance {
    pub marketplace: String,
    pub currency: String,
    pub units_sold: i64,
    pub total_royalty: f64,
    pub record_count: i64,
}

/// Monthly totals in the original currency.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`.
    pub month: String,
    pub currency: String,
    pub units_sold: i64,
    pub kenp_read: i64,
    pub total_royalty: f64,
}

/// Payments rows grouped for consolidation.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentGroup {
    pub currency: String,
    pub marketplace: String,
    pub total_earnings: f64,
    pub payment_count: i64,
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
    pub import_ids: Vec<DbId>,
}
