//! Master-book aggregation: running per-ASIN, per-format totals.
//!
//! Each import contributes a [`BookAggregate`] per (ASIN, format). The
//! aggregate is merged into whatever the user already has stored, so the
//! master book reflects every import it has seen. Breakdown maps are merged
//! key by key rather than replaced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::NormalizedRecord;
use crate::currency::{CurrencyAmounts, RateTable};
use crate::format::BookFormat;
use crate::types::{Date, DbId};

/// Key used in the sales breakdown when a row carries no currency.
pub const UNKNOWN_CURRENCY: &str = "UNKNOWN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceStats {
    pub units_sold: i64,
    pub royalties: f64,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesTypeStats {
    pub units: i64,
    pub royalties: f64,
}

/// Unit sales vs KENP page reads, each keyed by currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesBreakdown {
    #[serde(default)]
    pub book_sales: BTreeMap<String, SalesTypeStats>,
    #[serde(default)]
    pub kenp_reads: BTreeMap<String, SalesTypeStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookTotals {
    pub total_units_sold: i64,
    pub total_units_refunded: i64,
    pub net_units_sold: i64,
    pub total_kenp_read: i64,
    pub first_sale_date: Option<Date>,
    pub last_sale_date: Option<Date>,
    pub royalties_by_currency: CurrencyAmounts,
    pub marketplace_breakdown: BTreeMap<String, MarketplaceStats>,
    pub sales_breakdown: SalesBreakdown,
    pub current_list_price: Option<f64>,
    pub current_offer_price: Option<f64>,
    pub current_currency: Option<String>,
}

fn add_stats(map: &mut BTreeMap<String, SalesTypeStats>, key: &str, units: i64, royalties: f64) {
    let entry = map.entry(key.to_string()).or_default();
    entry.units += units;
    entry.royalties += royalties;
}

fn earliest(a: Option<Date>, b: Option<Date>) -> Option<Date> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

fn latest(a: Option<Date>, b: Option<Date>) -> Option<Date> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

impl BookTotals {
    pub fn add_record(&mut self, rec: &NormalizedRecord) {
        let units = i64::from(rec.units_sold.unwrap_or(0));
        let kenp = i64::from(rec.kenp_read.unwrap_or(0));
        let royalty = rec.royalty_or_zero();

        self.total_units_sold += units;
        self.total_units_refunded += i64::from(rec.units_refunded.unwrap_or(0));
        self.net_units_sold += i64::from(rec.net_units_sold.unwrap_or(0));
        self.total_kenp_read += kenp;

        let newer_or_equal = match (rec.sales_date, self.last_sale_date) {
            (Some(d), Some(last)) => d >= last,
            _ => true,
        };
        self.first_sale_date = earliest(self.first_sale_date, rec.sales_date);
        self.last_sale_date = latest(self.last_sale_date, rec.sales_date);

        if let (Some(currency), Some(r)) = (&rec.currency, rec.royalty) {
            *self.royalties_by_currency.entry(currency.clone()).or_insert(0.0) += r;
        }

        if let Some(marketplace) = &rec.marketplace {
            let entry = self
                .marketplace_breakdown
                .entry(marketplace.clone())
                .or_insert_with(|| MarketplaceStats {
                    currency: rec.currency.clone(),
                    ..Default::default()
                });
            entry.units_sold += units;
            entry.royalties += royalty;
        }

        let currency = rec.currency.as_deref().unwrap_or(UNKNOWN_CURRENCY);
        if kenp > 0 {
            add_stats(&mut self.sales_breakdown.kenp_reads, currency, kenp, royalty);
        } else {
            add_stats(&mut self.sales_breakdown.book_sales, currency, units, royalty);
        }

        if newer_or_equal {
            if let Some(price) = rec.list_price.filter(|p| *p > 0.0) {
                self.current_list_price = Some(price);
                self.current_currency = rec.currency.clone();
            }
            if let Some(price) = rec.offer_price.filter(|p| *p > 0.0) {
                self.current_offer_price = Some(price);
            }
        }
    }

    /// Fold `newer` (a later import) into these totals.
    pub fn merge(&mut self, newer: &BookTotals) {
        self.total_units_sold += newer.total_units_sold;
        self.total_units_refunded += newer.total_units_refunded;
        self.net_units_sold += newer.net_units_sold;
        self.total_kenp_read += newer.total_kenp_read;
        self.first_sale_date = earliest(self.first_sale_date, newer.first_sale_date);
        self.last_sale_date = latest(self.last_sale_date, newer.last_sale_date);

        for (currency, amount) in &newer.royalties_by_currency {
            *self.royalties_by_currency.entry(currency.clone()).or_insert(0.0) += amount;
        }

        for (marketplace, stats) in &newer.marketplace_breakdown {
            let entry = self
                .marketplace_breakdown
                .entry(marketplace.clone())
                .or_default();
            entry.units_sold += stats.units_sold;
            entry.royalties += stats.royalties;
            if entry.currency.is_none() {
                entry.currency = stats.currency.clone();
            }
        }

        for (currency, stats) in &newer.sales_breakdown.book_sales {
            add_stats(&mut self.sales_breakdown.book_sales, currency, stats.units, stats.royalties);
        }
        for (currency, stats) in &newer.sales_breakdown.kenp_reads {
            add_stats(&mut self.sales_breakdown.kenp_reads, currency, stats.units, stats.royalties);
        }

        if newer.current_list_price.is_some() {
            self.current_list_price = newer.current_list_price;
            self.current_currency = newer.current_currency.clone();
        }
        if newer.current_offer_price.is_some() {
            self.current_offer_price = newer.current_offer_price;
        }
    }

    pub fn total_royalties_usd(&self, rates: &RateTable) -> f64 {
        rates.total_usd(&self.royalties_by_currency)
    }
}

/// Totals of one import for one (ASIN, format) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookAggregate {
    pub asin: String,
    pub format: BookFormat,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub totals: BookTotals,
}

/// Group records that carry an ASIN by (ASIN, format). Records without a
/// format count as ebooks. Groups come back sorted by key.
pub fn aggregate_by_asin_format(records: &[NormalizedRecord]) -> Vec<BookAggregate> {
    let mut groups: BTreeMap<(String, BookFormat), BookAggregate> = BTreeMap::new();

    for rec in records {
        let Some(asin) = rec.asin.as_deref().map(str::trim).filter(|a| !a.is_empty()) else {
            continue;
        };
        let format = rec.format.unwrap_or(BookFormat::Ebook);
        let group = groups
            .entry((asin.to_string(), format))
            .or_insert_with(|| BookAggregate {
                asin: asin.to_string(),
                format,
                isbn: rec.isbn.clone(),
                title: rec.title.clone(),
                author_name: rec.author_name.clone(),
                totals: BookTotals::default(),
            });
        if group.title.is_none() {
            group.title = rec.title.clone();
        }
        if group.author_name.is_none() {
            group.author_name = rec.author_name.clone();
        }
        group.totals.add_record(rec);
    }

    groups.into_values().collect()
}

/// Append `import_id` to a source list once.
pub fn add_source_import(sources: &mut Vec<DbId>, import_id: DbId) {
    if !sources.contains(&import_id) {
        sources.push(import_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(asin: &str, format: Option<BookFormat>, day: u32) -> NormalizedRecord {
        NormalizedRecord {
            asin: Some(asin.into()),
            title: Some("Tide".into()),
            format,
            marketplace: Some("Amazon.com".into()),
            currency: Some("USD".into()),
            sales_date: NaiveDate::from_ymd_opt(2025, 1, day),
            units_sold: Some(2),
            royalty: Some(4.0),
            ..Default::default()
        }
    }

    #[test]
    fn groups_by_asin_and_format() {
        let records = vec![
            rec("B0TIDE0001", None, 3),
            rec("B0TIDE0001", Some(BookFormat::Ebook), 1),
            rec("B0TIDE0001", Some(BookFormat::Paperback), 2),
            NormalizedRecord {
                isbn: Some("9781234567897".into()),
                ..Default::default()
            },
        ];
        let groups = aggregate_by_asin_format(&records);
        assert_eq!(groups.len(), 2);

        let ebook = &groups[0];
        assert_eq!(ebook.format, BookFormat::Ebook);
        assert_eq!(ebook.totals.total_units_sold, 4);
        assert_eq!(ebook.totals.first_sale_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(ebook.totals.last_sale_date, NaiveDate::from_ymd_opt(2025, 1, 3));
        assert_eq!(ebook.totals.royalties_by_currency["USD"], 8.0);
        assert_eq!(ebook.totals.marketplace_breakdown["Amazon.com"].units_sold, 4);
        assert_eq!(ebook.totals.sales_breakdown.book_sales["USD"].units, 4);
    }

    #[test]
    fn kenp_rows_go_to_kenp_breakdown() {
        let mut r = rec("B0TIDE0001", None, 1);
        r.units_sold = None;
        r.kenp_read = Some(900);
        r.royalty = Some(3.6);
        let groups = aggregate_by_asin_format(&[r]);
        let totals = &groups[0].totals;
        assert_eq!(totals.total_kenp_read, 900);
        assert_eq!(totals.sales_breakdown.kenp_reads["USD"].units, 900);
        assert!(totals.sales_breakdown.book_sales.is_empty());
    }

    #[test]
    fn current_price_follows_latest_sale() {
        let mut newer = rec("B0TIDE0001", None, 20);
        newer.list_price = Some(4.99);
        let mut older = rec("B0TIDE0001", None, 5);
        older.list_price = Some(2.99);
        let groups = aggregate_by_asin_format(&[newer, older]);
        assert_eq!(groups[0].totals.current_list_price, Some(4.99));
    }

    #[test]
    fn merge_accumulates_and_merges_breakdowns() {
        let mut stored = aggregate_by_asin_format(&[rec("B0TIDE0001", None, 10)])
            .remove(0)
            .totals;
        let mut de = rec("B0TIDE0001", None, 2);
        de.marketplace = Some("Amazon.de".into());
        de.currency = Some("EUR".into());
        de.list_price = Some(3.99);
        let incoming = aggregate_by_asin_format(&[de, rec("B0TIDE0001", None, 12)])
            .remove(0)
            .totals;

        stored.merge(&incoming);
        assert_eq!(stored.total_units_sold, 6);
        assert_eq!(stored.first_sale_date, NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(stored.last_sale_date, NaiveDate::from_ymd_opt(2025, 1, 12));
        assert_eq!(stored.marketplace_breakdown.len(), 2);
        assert_eq!(stored.marketplace_breakdown["Amazon.com"].units_sold, 4);
        assert_eq!(stored.royalties_by_currency["EUR"], 4.0);
        assert_eq!(stored.current_list_price, Some(3.99));
        assert_eq!(stored.current_currency.as_deref(), Some("EUR"));

        let usd = stored.total_royalties_usd(&RateTable::fallback());
        assert!((usd - (8.0 + 4.0 / 0.95)).abs() < 1e-9);
    }

    #[test]
    fn source_imports_are_unique() {
        let mut sources = vec![1, 2];
        add_source_import(&mut sources, 2);
        add_source_import(&mut sources, 3);
        assert_eq!(sources, vec![1, 2, 3]);
    }
}
