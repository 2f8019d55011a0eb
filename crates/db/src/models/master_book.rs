//! Master book model: per user, per ASIN and format running totals.

use kdpdesk_core::kdp::aggregation::BookTotals;
use kdpdesk_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `master_books` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MasterBook {
    pub id: DbId,
    pub user_id: DbId,
    pub asin: String,
    pub format: String,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub total_units_sold: i64,
    pub total_units_refunded: i64,
    pub net_units_sold: i64,
    pub total_kenp_read: i64,
    pub total_royalties_usd: f64,
    pub royalties_by_currency: serde_json::Value,
    pub marketplace_breakdown: serde_json::Value,
    pub sales_breakdown: serde_json::Value,
    pub first_sale_date: Option<Date>,
    pub last_sale_date: Option<Date>,
    pub current_list_price: Option<f64>,
    pub current_offer_price: Option<f64>,
    pub current_currency: Option<String>,
    pub source_imports: Vec<DbId>,
    pub last_import_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MasterBook {
    /// Stored totals as the in-memory aggregate. Unreadable JSON columns
    /// decode as empty maps.
    pub fn totals(&self) -> BookTotals {
        BookTotals {
            total_units_sold: self.total_units_sold,
            total_units_refunded: self.total_units_refunded,
            net_units_sold: self.net_units_sold,
            total_kenp_read: self.total_kenp_read,
            first_sale_date: self.first_sale_date,
            last_sale_date: self.last_sale_date,
            royalties_by_currency: serde_json::from_value(self.royalties_by_currency.clone())
                .unwrap_or_default(),
            marketplace_breakdown: serde_json::from_value(self.marketplace_breakdown.clone())
                .unwrap_or_default(),
            sales_breakdown: serde_json::from_value(self.sales_breakdown.clone())
                .unwrap_or_default(),
            current_list_price: self.current_list_price,
            current_offer_price: self.current_offer_price,
            current_currency: self.current_currency.clone(),
        }
    }
}

/// Full state written by an upsert.
#[derive(Debug, Clone)]
pub struct UpsertMasterBook {
    pub asin: String,
    pub format: String,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub totals: BookTotals,
    pub total_royalties_usd: f64,
    pub source_imports: Vec<DbId>,
    pub last_import_id: DbId,
}
