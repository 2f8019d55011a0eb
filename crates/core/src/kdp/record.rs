//! The normalized shape every KDP row is converted into.

use serde::Serialize;

use crate::format::BookFormat;
use crate::types::Date;

/// One spreadsheet row after column mapping and type conversion.
///
/// Field names follow the `kdp_import_data` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub sheet_name: String,
    /// 1-based spreadsheet row number (header is row 1).
    pub row_index: i32,

    pub asin: Option<String>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub marketplace: Option<String>,
    pub sales_date: Option<Date>,
    pub format: Option<BookFormat>,

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

    /// `{ header: value }` for the whole source row.
    pub raw_data: serde_json::Map<String, serde_json::Value>,
    /// Unrecognised columns keyed by normalized header.
    pub extra_fields: serde_json::Map<String, serde_json::Value>,
}

impl NormalizedRecord {
    /// ASIN if present, else ISBN.
    pub fn identifier(&self) -> Option<&str> {
        self.asin
            .as_deref()
            .or(self.isbn.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn royalty_or_zero(&self) -> f64 {
        self.royalty.unwrap_or(0.0)
    }

    /// Whether the row describes page reads rather than unit sales.
    pub fn is_kenp(&self) -> bool {
        self.kenp_read.is_some_and(|k| k > 0) || self.sheet_name.to_lowercase().contains("kenp")
    }
}
