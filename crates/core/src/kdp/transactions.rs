//! Transaction-type filtering and per-type statistics.
//!
//! The Royalties Estimator lists every transaction KDP recorded. Only rows
//! without a transaction type (regular sales) and the promotional /
//! expanded-distribution rows are kept; everything else (refund
//! adjustments, pre-orders, etc.) is already reflected in the net figures.

use std::collections::BTreeMap;

use serde::Serialize;

use super::record::NormalizedRecord;

pub const TRANSACTION_FREE_PROMOTION: &str = "Free - Promotion";
pub const TRANSACTION_EXPANDED_DISTRIBUTION: &str = "Expanded Distribution Channels";

pub const ESTIMATOR_TRANSACTION_TYPES: &[&str] =
    &[TRANSACTION_FREE_PROMOTION, TRANSACTION_EXPANDED_DISTRIBUTION];

/// Label used in statistics for rows without a transaction type.
pub const TRANSACTION_STANDARD: &str = "Standard";

pub fn passes_estimator_filter(transaction_type: Option<&str>) -> bool {
    match transaction_type {
        None | Some("") => true,
        Some(t) => ESTIMATOR_TRANSACTION_TYPES.contains(&t.trim()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionBucket {
    pub count: usize,
    pub total_royalty: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionStats {
    pub total_records: usize,
    pub total_royalty: f64,
    pub by_transaction_type: BTreeMap<String, TransactionBucket>,
    pub by_sheet: BTreeMap<String, TransactionBucket>,
}

pub fn transaction_stats<'a, I>(records: I) -> TransactionStats
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut stats = TransactionStats::default();
    for rec in records {
        let royalty = rec.royalty_or_zero();
        stats.total_records += 1;
        stats.total_royalty += royalty;

        let kind = rec
            .transaction_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| TRANSACTION_STANDARD.to_string());
        let bucket = stats.by_transaction_type.entry(kind).or_default();
        bucket.count += 1;
        bucket.total_royalty += royalty;

        let bucket = stats.by_sheet.entry(rec.sheet_name.clone()).or_default();
        bucket.count += 1;
        bucket.total_royalty += royalty;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_keeps_untyped_and_listed_types() {
        assert!(passes_estimator_filter(None));
        assert!(passes_estimator_filter(Some("")));
        assert!(passes_estimator_filter(Some("Free - Promotion")));
        assert!(passes_estimator_filter(Some(" Expanded Distribution Channels ")));
        assert!(!passes_estimator_filter(Some("Standard")));
        assert!(!passes_estimator_filter(Some("Refund")));
    }

    #[test]
    fn whitespace_only_type_is_not_untyped() {
        assert!(!passes_estimator_filter(Some("   ")));
        assert!(!passes_estimator_filter(Some("\t")));
    }

    #[test]
    fn stats_group_by_type_and_sheet() {
        let records = vec![
            NormalizedRecord {
                sheet_name: "eBook Royalty".into(),
                royalty: Some(2.0),
                ..Default::default()
            },
            NormalizedRecord {
                sheet_name: "eBook Royalty".into(),
                transaction_type: Some(TRANSACTION_FREE_PROMOTION.into()),
                royalty: Some(0.0),
                ..Default::default()
            },
            NormalizedRecord {
                sheet_name: "Paperback Royalty".into(),
                royalty: Some(3.5),
                ..Default::default()
            },
        ];
        let stats = transaction_stats(&records);
        assert_eq!(stats.total_records, 3);
        assert!((stats.total_royalty - 5.5).abs() < 1e-9);
        assert_eq!(stats.by_transaction_type[TRANSACTION_STANDARD].count, 2);
        assert_eq!(stats.by_transaction_type[TRANSACTION_FREE_PROMOTION].count, 1);
        assert_eq!(stats.by_sheet["eBook Royalty"].count, 2);
        assert!((stats.by_sheet["Paperback Royalty"].total_royalty - 3.5).abs() < 1e-9);
    }
}
