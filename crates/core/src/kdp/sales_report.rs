//! Simple KDP sales reports (one sheet, one row per book and marketplace).
//!
//! These feed `sales_data` directly and predate the full import pipeline.

use serde::Serialize;

use super::normalize::{parse_date, parse_decimal, parse_integer};
use super::spreadsheet::{Workbook, EMPTY_CELL};
use crate::format::BookFormat;
use crate::types::Date;

pub const DEFAULT_MARKETPLACE: &str = "Unknown";

const TITLE_HEADERS: &[&str] = &["title", "book title", "product title"];
const ASIN_HEADERS: &[&str] = &["asin", "product asin"];
const MARKETPLACE_HEADERS: &[&str] = &["marketplace", "country"];
const FORMAT_HEADERS: &[&str] = &["format", "product format", "type"];
const UNITS_HEADERS: &[&str] = &["units sold", "quantity", "sales"];
const REVENUE_HEADERS: &[&str] = &["net revenue", "revenue", "earnings"];
const ROYALTY_HEADERS: &[&str] = &["royalty", "author royalty"];
const DATE_HEADERS: &[&str] = &["date", "report date", "sale date"];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SalesReportError {
    #[error("Invalid KDP report format: insufficient data")]
    InsufficientData,

    #[error("Invalid KDP report format: missing required columns (units sold, revenue)")]
    MissingColumns,

    #[error("No valid sales records found in the report")]
    NoRecords,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReportRecord {
    pub report_date: Date,
    pub format: BookFormat,
    pub marketplace: String,
    pub units_sold: i32,
    pub revenue: f64,
    pub royalty: f64,
    pub title: Option<String>,
    pub asin: Option<String>,
}

/// Index of the first header containing any candidate, candidates tried in order.
fn find_header(headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|name| headers.iter().position(|h| h.contains(name)))
}

/// Parse the first sheet of a simple sales report. Rows without a parsable
/// date fall back to `today`.
pub fn parse_sales_report(
    workbook: &Workbook,
    today: Date,
) -> Result<Vec<SalesReportRecord>, SalesReportError> {
    let sheet = workbook
        .sheets
        .first()
        .filter(|s| s.rows.len() >= 2)
        .ok_or(SalesReportError::InsufficientData)?;

    let headers: Vec<String> = sheet.headers().iter().map(|h| h.to_lowercase()).collect();

    let units_col = find_header(&headers, UNITS_HEADERS);
    let revenue_col = find_header(&headers, REVENUE_HEADERS);
    let (Some(units_col), Some(revenue_col)) = (units_col, revenue_col) else {
        return Err(SalesReportError::MissingColumns);
    };
    let title_col = find_header(&headers, TITLE_HEADERS);
    let asin_col = find_header(&headers, ASIN_HEADERS);
    let marketplace_col = find_header(&headers, MARKETPLACE_HEADERS);
    let format_col = find_header(&headers, FORMAT_HEADERS);
    let royalty_col = find_header(&headers, ROYALTY_HEADERS);
    let date_col = find_header(&headers, DATE_HEADERS);

    let mut records = Vec::new();
    for row in sheet.data_rows() {
        if row.is_empty() {
            continue;
        }
        let cell = |col: Option<usize>| col.and_then(|c| row.get(c)).unwrap_or(&EMPTY_CELL);
        let text = |col: Option<usize>| cell(col).as_text();

        let record = SalesReportRecord {
            report_date: parse_date(cell(date_col)).unwrap_or(today),
            format: BookFormat::from_report_text(&text(format_col).unwrap_or_default()),
            marketplace: text(marketplace_col).unwrap_or_else(|| DEFAULT_MARKETPLACE.to_string()),
            units_sold: parse_integer(cell(Some(units_col))).unwrap_or(0),
            revenue: parse_decimal(cell(Some(revenue_col))).unwrap_or(0.0),
            royalty: parse_decimal(cell(royalty_col)).unwrap_or(0.0),
            title: title_col.map(|_| text(title_col).unwrap_or_default()),
            asin: asin_col.map(|_| text(asin_col).unwrap_or_default()),
        };

        if record.units_sold > 0 || record.revenue > 0.0 {
            records.push(record);
        }
    }

    if records.is_empty() {
        return Err(SalesReportError::NoRecords);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdp::spreadsheet::test_support::sheet;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn today() -> Date {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn parses_rows_with_sales() {
        let wb = Workbook {
            sheets: vec![sheet(
                "Report",
                &[
                    &["Title", "ASIN", "Marketplace", "Format", "Units Sold", "Net Revenue", "Royalty", "Date"],
                    &["Tide", "B0TIDE0001", "Amazon.com", "Kindle", "3", "8.97", "6.28", "2025-05-02"],
                    &["Tide", "B0TIDE0001", "Amazon.de", "Paperback", "0", "0", "0", "2025-05-02"],
                    &["Tide", "", "", "Hardback", "1", "", "", ""],
                ],
            )],
        };
        let records = parse_sales_report(&wb, today()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].format, BookFormat::Ebook);
        assert_eq!(records[0].units_sold, 3);
        assert_eq!(
            records[0].report_date,
            NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()
        );
        assert_eq!(records[1].format, BookFormat::Hardcover);
        assert_eq!(records[1].marketplace, DEFAULT_MARKETPLACE);
        assert_eq!(records[1].report_date, today());
        assert_eq!(records[1].asin.as_deref(), Some(""));
    }

    #[test]
    fn requires_units_and_revenue_columns() {
        let wb = Workbook {
            sheets: vec![sheet("Report", &[&["Title", "Units Sold"], &["Tide", "1"]])],
        };
        assert_matches!(
            parse_sales_report(&wb, today()),
            Err(SalesReportError::MissingColumns)
        );
    }

    #[test]
    fn header_only_or_zero_rows() {
        let header_only = Workbook {
            sheets: vec![sheet("Report", &[&["Units Sold", "Revenue"]])],
        };
        assert_matches!(
            parse_sales_report(&header_only, today()),
            Err(SalesReportError::InsufficientData)
        );

        let zero = Workbook {
            sheets: vec![sheet("Report", &[&["Units Sold", "Revenue"], &["0", "0"]])],
        };
        assert_matches!(
            parse_sales_report(&zero, today()),
            Err(SalesReportError::NoRecords)
        );
    }
}
