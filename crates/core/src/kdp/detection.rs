//! Recognise which KDP export a file is.
//!
//! Names win over content: KDP's own download names are reliable, sheet and
//! header heuristics only kick in for renamed files.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::spreadsheet::Workbook;

/// Estimator sheet repeating every row of the per-format royalty sheets.
pub const ESTIMATOR_SUMMARY_SHEET: &str = "Combined Sales";

/// Sheets present in every Royalties Estimator export.
pub const ESTIMATOR_REQUIRED_SHEETS: &[&str] = &[ESTIMATOR_SUMMARY_SHEET, "eBook Royalty"];

/// Sheets the estimator processor reads, in order.
pub const ESTIMATOR_SHEETS: &[&str] = &[
    ESTIMATOR_SUMMARY_SHEET,
    "eBook Royalty",
    "Paperback Royalty",
    "Hardcover Royalty",
    "KENP Read",
    "eBook Orders Placed",
];

/// Leading headers of the `Combined Sales` sheet.
pub const ESTIMATOR_COMBINED_HEADERS: &[&str] = &[
    "Royalty Date",
    "Title",
    "Author Name",
    "ASIN/ISBN",
    "Marketplace",
    "Royalty Type",
    "Transaction Type",
    "Units Sold",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KdpFileType {
    Payments,
    PriorMonthRoyalties,
    KenpRead,
    Dashboard,
    RoyaltiesEstimator,
    Orders,
    Unknown,
}

impl KdpFileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payments => "payments",
            Self::PriorMonthRoyalties => "prior_month_royalties",
            Self::KenpRead => "kenp_read",
            Self::Dashboard => "dashboard",
            Self::RoyaltiesEstimator => "royalties_estimator",
            Self::Orders => "orders",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "payments" => Self::Payments,
            "prior_month_royalties" => Self::PriorMonthRoyalties,
            "kenp_read" => Self::KenpRead,
            "dashboard" => Self::Dashboard,
            "royalties_estimator" => Self::RoyaltiesEstimator,
            "orders" => Self::Orders,
            "unknown" => Self::Unknown,
            _ => return None,
        })
    }

    /// Whether rows of `sheet_name` become sales records. The estimator's
    /// summary sheet only repeats the per-format sheets.
    pub fn normalizes_sheet(&self, sheet_name: &str) -> bool {
        !(*self == Self::RoyaltiesEstimator && sheet_name == ESTIMATOR_SUMMARY_SHEET)
    }
}

impl fmt::Display for KdpFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an uploaded file. The first matching rule wins.
pub fn detect_file_type(file_name: &str, workbook: &Workbook) -> KdpFileType {
    if let Some(t) = detect_from_file_name(file_name) {
        return t;
    }

    if is_royalties_estimator(workbook) {
        return KdpFileType::RoyaltiesEstimator;
    }

    let sheet_names: Vec<String> = workbook.sheet_names().map(str::to_lowercase).collect();
    let headers: Vec<String> = workbook
        .all_headers()
        .iter()
        .map(|h| h.to_lowercase())
        .collect();

    let any_sheet = |needles: &[&str]| {
        sheet_names
            .iter()
            .any(|s| needles.iter().any(|n| s.contains(n)))
    };
    let any_header = |needles: &[&str]| {
        headers
            .iter()
            .any(|h| needles.iter().any(|n| h.contains(n)))
    };

    if any_sheet(&["royalty", "kenp", "earnings"]) {
        KdpFileType::PriorMonthRoyalties
    } else if any_header(&["payment", "net earnings"]) {
        KdpFileType::Payments
    } else if any_header(&["kenp", "normalized page"]) {
        KdpFileType::KenpRead
    } else if any_sheet(&["orders", "ebook"]) {
        KdpFileType::Dashboard
    } else if any_header(&["paid units", "free units"]) {
        KdpFileType::Orders
    } else {
        KdpFileType::Unknown
    }
}

fn detect_from_file_name(file_name: &str) -> Option<KdpFileType> {
    let name = file_name.to_lowercase();
    if name.contains("payment") {
        Some(KdpFileType::Payments)
    } else if name.contains("prior_month_royalties") || name.contains("royalties") {
        Some(KdpFileType::PriorMonthRoyalties)
    } else if name.contains("kenp_read") {
        Some(KdpFileType::KenpRead)
    } else if name.contains("dashboard") {
        Some(KdpFileType::Dashboard)
    } else if name.contains("estimator") {
        Some(KdpFileType::RoyaltiesEstimator)
    } else if name.contains("orders") {
        Some(KdpFileType::Orders)
    } else {
        None
    }
}

/// Whether the workbook has the Royalties Estimator shape: both required
/// sheets and the exact leading `Combined Sales` headers.
pub fn is_royalties_estimator(workbook: &Workbook) -> bool {
    if !ESTIMATOR_REQUIRED_SHEETS
        .iter()
        .all(|name| workbook.sheet(name).is_some())
    {
        return false;
    }

    let Some(combined) = workbook.sheet(ESTIMATOR_SUMMARY_SHEET) else {
        return false;
    };
    let headers = combined.headers();
    headers.len() >= ESTIMATOR_COMBINED_HEADERS.len()
        && headers
            .iter()
            .zip(ESTIMATOR_COMBINED_HEADERS)
            .all(|(actual, expected)| actual == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdp::spreadsheet::test_support::sheet;

    fn estimator_workbook() -> Workbook {
        Workbook {
            sheets: vec![
                sheet("Combined Sales", &[ESTIMATOR_COMBINED_HEADERS]),
                sheet("eBook Royalty", &[&["Royalty Date", "Title"]]),
            ],
        }
    }

    #[test]
    fn file_name_rules_take_priority() {
        let wb = estimator_workbook();
        assert_eq!(detect_file_type("Payments_2025.xlsx", &wb), KdpFileType::Payments);
        assert_eq!(
            detect_file_type("prior_month_royalties.xlsx", &wb),
            KdpFileType::PriorMonthRoyalties
        );
        assert_eq!(detect_file_type("kenp_read-03.xlsx", &wb), KdpFileType::KenpRead);
        assert_eq!(detect_file_type("Dashboard.xlsx", &wb), KdpFileType::Dashboard);
        assert_eq!(detect_file_type("orders.csv", &wb), KdpFileType::Orders);
    }

    #[test]
    fn royalties_in_name_beats_estimator() {
        let wb = Workbook::default();
        assert_eq!(
            detect_file_type("KDP_Royalties_Estimator.xlsx", &wb),
            KdpFileType::PriorMonthRoyalties
        );
        assert_eq!(
            detect_file_type("estimator.xlsx", &wb),
            KdpFileType::RoyaltiesEstimator
        );
    }

    #[test]
    fn estimator_signature_detected_for_renamed_file() {
        assert_eq!(
            detect_file_type("upload.xlsx", &estimator_workbook()),
            KdpFileType::RoyaltiesEstimator
        );
    }

    #[test]
    fn estimator_requires_exact_headers() {
        let mut wb = estimator_workbook();
        wb.sheets[0] = sheet("Combined Sales", &[&["Date", "Title"]]);
        assert!(!is_royalties_estimator(&wb));

        let wb = Workbook {
            sheets: vec![sheet("Combined Sales", &[ESTIMATOR_COMBINED_HEADERS])],
        };
        assert!(!is_royalties_estimator(&wb));
    }

    #[test]
    fn estimator_summary_sheet_is_not_normalized() {
        let estimator = KdpFileType::RoyaltiesEstimator;
        assert!(!estimator.normalizes_sheet("Combined Sales"));
        assert!(estimator.normalizes_sheet("eBook Royalty"));
        assert!(estimator.normalizes_sheet("Paperback Royalty"));
        assert!(KdpFileType::PriorMonthRoyalties.normalizes_sheet("Combined Sales"));
    }

    #[test]
    fn content_rules() {
        let by_sheet = Workbook {
            sheets: vec![sheet("Monthly Earnings", &[&["Title"]])],
        };
        assert_eq!(
            detect_file_type("upload.xlsx", &by_sheet),
            KdpFileType::PriorMonthRoyalties
        );

        let by_payment_header = Workbook {
            sheets: vec![sheet("Sheet1", &[&["Marketplace", "Net Earnings"]])],
        };
        assert_eq!(
            detect_file_type("upload.csv", &by_payment_header),
            KdpFileType::Payments
        );

        let by_kenp_header = Workbook {
            sheets: vec![sheet("Sheet1", &[&["Title", "Normalized Pages"]])],
        };
        assert_eq!(
            detect_file_type("upload.csv", &by_kenp_header),
            KdpFileType::KenpRead
        );

        let by_orders_sheet = Workbook {
            sheets: vec![sheet("Orders", &[&["Title"]])],
        };
        assert_eq!(
            detect_file_type("upload.xlsx", &by_orders_sheet),
            KdpFileType::Dashboard
        );

        let by_units_header = Workbook {
            sheets: vec![sheet("Sheet1", &[&["Title", "Paid Units", "Free Units"]])],
        };
        assert_eq!(
            detect_file_type("upload.csv", &by_units_header),
            KdpFileType::Orders
        );

        let unknown = Workbook {
            sheets: vec![sheet("Sheet1", &[&["Foo", "Bar"]])],
        };
        assert_eq!(detect_file_type("upload.csv", &unknown), KdpFileType::Unknown);
    }

    #[test]
    fn type_names_round_trip() {
        for t in [
            KdpFileType::Payments,
            KdpFileType::PriorMonthRoyalties,
            KdpFileType::KenpRead,
            KdpFileType::Dashboard,
            KdpFileType::RoyaltiesEstimator,
            KdpFileType::Orders,
            KdpFileType::Unknown,
        ] {
            assert_eq!(KdpFileType::parse(t.as_str()), Some(t));
        }
    }
}
