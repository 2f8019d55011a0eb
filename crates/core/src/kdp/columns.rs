//! Map KDP report headers onto canonical record fields.
//!
//! KDP renames columns between report types and over time ("Royalty Date"
//! vs "Date", "Net Units Sold" vs "Units Sold"). Headers are normalized to
//! snake case and matched against per-field patterns: an exact pattern
//! match wins, otherwise the longest pattern contained in the header.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KdpField {
    AsinOrIsbn,
    Asin,
    Isbn,
    Title,
    AuthorName,
    Marketplace,
    SalesDate,
    UnitsSold,
    UnitsRefunded,
    NetUnitsSold,
    PaidUnits,
    FreeUnits,
    Currency,
    ListPrice,
    OfferPrice,
    Royalty,
    RoyaltyType,
    KenpRead,
    TransactionType,
    PaymentStatus,
    FileSize,
    DeliveryCost,
    ManufacturingCost,
}

/// Field patterns in declaration order; order breaks ties between equally
/// long containment matches.
const FIELD_PATTERNS: &[(KdpField, &[&str])] = &[
    (KdpField::AsinOrIsbn, &["asin_isbn", "asin_or_isbn"]),
    (KdpField::Asin, &["asin"]),
    (KdpField::Isbn, &["isbn"]),
    (KdpField::Title, &["title", "book_title", "publication_title"]),
    (KdpField::AuthorName, &["author", "author_name", "author_name_s"]),
    (KdpField::Marketplace, &["marketplace", "market_place", "country"]),
    (
        KdpField::SalesDate,
        &["date", "sales_date", "order_date", "royalty_date"],
    ),
    (KdpField::UnitsSold, &["units_sold"]),
    (KdpField::UnitsRefunded, &["units_refunded"]),
    (KdpField::NetUnitsSold, &["net_units_sold", "net_units"]),
    (KdpField::PaidUnits, &["paid_units"]),
    (KdpField::FreeUnits, &["free_units"]),
    (KdpField::Currency, &["currency"]),
    (
        KdpField::ListPrice,
        &["list_price", "avg_list_price_without_tax"],
    ),
    (
        KdpField::OfferPrice,
        &["offer_price", "avg_offer_price_without_tax"],
    ),
    (KdpField::Royalty, &["royalty", "earnings"]),
    (KdpField::RoyaltyType, &["royalty_type", "royalty_rate"]),
    (
        KdpField::KenpRead,
        &["kenp_read", "kindle_edition_normalized_page_kenp_read"],
    ),
    (KdpField::TransactionType, &["transaction_type"]),
    (KdpField::PaymentStatus, &["payment_status"]),
    (KdpField::FileSize, &["avg_file_size_mb", "file_size"]),
    (KdpField::DeliveryCost, &["avg_delivery_cost", "delivery_cost"]),
    (
        KdpField::ManufacturingCost,
        &[
            "avg_delivery_manufacturing_cost",
            "manufacturing_cost",
            "printing_cost",
        ],
    ),
];

impl KdpField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AsinOrIsbn => "asin_or_isbn",
            Self::Asin => "asin",
            Self::Isbn => "isbn",
            Self::Title => "title",
            Self::AuthorName => "author_name",
            Self::Marketplace => "marketplace",
            Self::SalesDate => "sales_date",
            Self::UnitsSold => "units_sold",
            Self::UnitsRefunded => "units_refunded",
            Self::NetUnitsSold => "net_units_sold",
            Self::PaidUnits => "paid_units",
            Self::FreeUnits => "free_units",
            Self::Currency => "currency",
            Self::ListPrice => "list_price",
            Self::OfferPrice => "offer_price",
            Self::Royalty => "royalty",
            Self::RoyaltyType => "royalty_type",
            Self::KenpRead => "kenp_read",
            Self::TransactionType => "transaction_type",
            Self::PaymentStatus => "payment_status",
            Self::FileSize => "file_size",
            Self::DeliveryCost => "delivery_cost",
            Self::ManufacturingCost => "manufacturing_cost",
        }
    }
}

/// Where a header's values go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTarget {
    Field(KdpField),
    /// Unrecognised column, kept under its normalized name.
    Other(String),
    /// Blank header cell; values are dropped.
    Ignored,
}

/// Lowercase, replace every non-alphanumeric run with a single `_`, trim `_`.
pub fn normalize_column_name(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    for ch in header.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Resolve a single header.
pub fn map_column(header: &str) -> ColumnTarget {
    let normalized = normalize_column_name(header);
    if normalized.is_empty() {
        return ColumnTarget::Ignored;
    }

    for (field, patterns) in FIELD_PATTERNS {
        if patterns.contains(&normalized.as_str()) {
            return ColumnTarget::Field(*field);
        }
    }

    let mut best: Option<(KdpField, usize)> = None;
    for (field, patterns) in FIELD_PATTERNS {
        for pattern in *patterns {
            if normalized.contains(pattern)
                && best.map_or(true, |(_, len)| pattern.len() > len)
            {
                best = Some((*field, pattern.len()));
            }
        }
    }

    match best {
        Some((field, _)) => ColumnTarget::Field(field),
        None => ColumnTarget::Other(normalized),
    }
}

static IGNORED: ColumnTarget = ColumnTarget::Ignored;

/// Per-sheet mapping from column index to target.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    pub headers: Vec<String>,
    pub targets: Vec<ColumnTarget>,
}

impl ColumnMapping {
    pub fn target(&self, index: usize) -> &ColumnTarget {
        self.targets.get(index).unwrap_or(&IGNORED)
    }

    pub fn has_field(&self, field: KdpField) -> bool {
        self.targets.contains(&ColumnTarget::Field(field))
    }

    /// `{ header: field_name }` for every recognised header, as stored in the
    /// import's `mapping_config`.
    pub fn to_config(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .zip(&self.targets)
            .filter_map(|(header, target)| match target {
                ColumnTarget::Field(field) => Some((header.clone(), field.as_str().to_string())),
                _ => None,
            })
            .collect()
    }
}

pub fn create_column_mapping(headers: &[String]) -> ColumnMapping {
    ColumnMapping {
        headers: headers.to_vec(),
        targets: headers.iter().map(|h| map_column(h)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(header: &str) -> Option<KdpField> {
        match map_column(header) {
            ColumnTarget::Field(f) => Some(f),
            _ => None,
        }
    }

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_column_name("Avg. File Size (MB)"), "avg_file_size_mb");
        assert_eq!(normalize_column_name("  ASIN/ISBN "), "asin_isbn");
        assert_eq!(normalize_column_name("Author Name(s)"), "author_name_s");
        assert_eq!(normalize_column_name("---"), "");
    }

    #[test]
    fn estimator_headers_map_exactly() {
        assert_eq!(field("Royalty Date"), Some(KdpField::SalesDate));
        assert_eq!(field("ASIN/ISBN"), Some(KdpField::AsinOrIsbn));
        assert_eq!(field("Royalty Type"), Some(KdpField::RoyaltyType));
        assert_eq!(field("Transaction Type"), Some(KdpField::TransactionType));
        assert_eq!(
            field("Avg. List Price without tax"),
            Some(KdpField::ListPrice)
        );
        assert_eq!(
            field("Avg. Delivery/Manufacturing cost"),
            Some(KdpField::ManufacturingCost)
        );
        assert_eq!(
            field("Kindle Edition Normalized Page (KENP) Read"),
            Some(KdpField::KenpRead)
        );
    }

    #[test]
    fn net_units_do_not_collapse_into_units_sold() {
        assert_eq!(field("Net Units Sold"), Some(KdpField::NetUnitsSold));
        assert_eq!(field("Units Sold"), Some(KdpField::UnitsSold));
        assert_eq!(field("Units Refunded"), Some(KdpField::UnitsRefunded));
    }

    #[test]
    fn containment_prefers_longest_pattern() {
        assert_eq!(field("Payment Date"), Some(KdpField::SalesDate));
        assert_eq!(field("Net Earnings"), Some(KdpField::Royalty));
        assert_eq!(field("Primary Author"), Some(KdpField::AuthorName));
        assert_eq!(field("Book Royalty Type"), Some(KdpField::RoyaltyType));
    }

    #[test]
    fn unknown_and_blank_headers() {
        assert_eq!(
            map_column("Expanded Distribution Cost"),
            ColumnTarget::Other("expanded_distribution_cost".into())
        );
        assert_eq!(map_column(""), ColumnTarget::Ignored);
    }

    #[test]
    fn mapping_config_lists_recognised_headers() {
        let headers = vec!["Title".to_string(), "Foo".to_string(), "Royalty".to_string()];
        let mapping = create_column_mapping(&headers);
        let config = mapping.to_config();
        assert_eq!(config.len(), 2);
        assert_eq!(config["Title"], "title");
        assert_eq!(config["Royalty"], "royalty");
        assert!(mapping.has_field(KdpField::Royalty));
        assert_eq!(mapping.target(99), &ColumnTarget::Ignored);
    }
}
