//! Duplicate detection across imports.
//!
//! Users routinely upload overlapping reports (this month's estimator after
//! last week's). A row is a duplicate when its key matches a row already
//! stored for the same user, or an earlier row of the same import.

use std::collections::HashSet;

use super::record::NormalizedRecord;

/// Key over `[asin, isbn, title, marketplace, format, sales_date, royalty,
/// currency]`: non-empty parts joined with `|`, lowercased. `None` when
/// every part is empty.
pub fn duplicate_key(rec: &NormalizedRecord) -> Option<String> {
    let parts = [
        rec.asin.clone(),
        rec.isbn.clone(),
        rec.title.clone(),
        rec.marketplace.clone(),
        rec.format.map(|f| f.as_str().to_string()),
        rec.sales_date.map(|d| d.to_string()),
        rec.royalty.map(|r| r.to_string()),
        rec.currency.clone(),
    ];
    build_key(parts.iter().map(|p| p.as_deref()))
}

/// Join pre-rendered key parts. Shared with the database layer, which
/// rebuilds keys for stored rows from the same columns.
pub fn build_key<'a, I>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let joined = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("|");
    (!joined.is_empty()).then(|| joined.to_lowercase())
}

/// Indices of `records` that are duplicates of `existing_keys` or of an
/// earlier record in the slice. Records without a key are never duplicates.
pub fn find_duplicates(existing_keys: &HashSet<String>, records: &[NormalizedRecord]) -> Vec<usize> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = Vec::new();

    for (i, rec) in records.iter().enumerate() {
        let Some(key) = duplicate_key(rec) else {
            continue;
        };
        if existing_keys.contains(&key) || !seen.insert(key) {
            duplicates.push(i);
        }
    }
    duplicates
}

/// Loose identity used when comparing against manually entered sales:
/// same identifier, same day, same marketplace.
pub fn is_same_sale(a: &NormalizedRecord, b: &NormalizedRecord) -> bool {
    a.identifier().is_some()
        && a.identifier() == b.identifier()
        && a.sales_date == b.sales_date
        && a.marketplace == b.marketplace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BookFormat;
    use chrono::NaiveDate;

    fn sale(asin: &str, royalty: f64) -> NormalizedRecord {
        NormalizedRecord {
            asin: Some(asin.into()),
            title: Some("Night Garden".into()),
            marketplace: Some("Amazon.com".into()),
            format: Some(BookFormat::Ebook),
            sales_date: NaiveDate::from_ymd_opt(2025, 1, 5),
            royalty: Some(royalty),
            currency: Some("USD".into()),
            ..Default::default()
        }
    }

    #[test]
    fn key_skips_empty_parts_and_lowercases() {
        let key = duplicate_key(&sale("B0NIGHT001", 2.5)).unwrap();
        assert_eq!(key, "b0night001|night garden|amazon.com|ebook|2025-01-05|2.5|usd");
        assert_eq!(duplicate_key(&NormalizedRecord::default()), None);
    }

    #[test]
    fn detects_within_import_and_against_existing() {
        let existing: HashSet<String> = [duplicate_key(&sale("B0OLD00001", 1.0)).unwrap()]
            .into_iter()
            .collect();
        let records = vec![
            sale("B0NIGHT001", 2.5),
            sale("B0OLD00001", 1.0),
            sale("B0NIGHT001", 2.5),
            sale("B0NIGHT001", 3.0),
            NormalizedRecord::default(),
            NormalizedRecord::default(),
        ];
        assert_eq!(find_duplicates(&existing, &records), vec![1, 2]);
    }

    #[test]
    fn same_sale_requires_identifier() {
        let a = sale("B0NIGHT001", 2.5);
        let mut b = sale("B0NIGHT001", 9.0);
        assert!(is_same_sale(&a, &b));
        b.marketplace = Some("Amazon.de".into());
        assert!(!is_same_sale(&a, &b));
        assert!(!is_same_sale(
            &NormalizedRecord::default(),
            &NormalizedRecord::default()
        ));
    }
}
