//! Stored exchange rates.

use kdpdesk_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `exchange_rates` table: `rate` units of `to_currency`
/// per one `from_currency` on `rate_date`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExchangeRate {
    pub id: DbId,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub rate_date: Date,
    /// `api` or `fallback`.
    pub source: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
