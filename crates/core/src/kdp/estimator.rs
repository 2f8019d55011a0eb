//! KDP Royalties Estimator workbooks.
//!
//! The estimator has fixed, documented column names per sheet, so rows are
//! mapped by exact header rather than through the fuzzy column matcher.

use serde::Serialize;

use super::detection::ESTIMATOR_SHEETS;
use super::normalize::{classify_identifier, parse_date, parse_decimal, parse_integer};
use super::spreadsheet::{is_blank_row, Cell, Workbook};
use super::transactions::passes_estimator_filter;
use crate::format::BookFormat;
use crate::types::Date;

/// One estimator row, field names as in `kdp_royalties_estimator_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EstimatorRecord {
    pub sheet_name: String,
    pub row_index: i32,
    pub royalty_date: Option<Date>,
    pub order_date: Option<Date>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub asin: Option<String>,
    pub isbn: Option<String>,
    pub marketplace: Option<String>,
    pub royalty_type: Option<String>,
    pub transaction_type: Option<String>,
    pub units_sold: Option<i32>,
    pub units_refunded: Option<i32>,
    pub net_units_sold: Option<i32>,
    pub avg_list_price: Option<f64>,
    pub avg_offer_price: Option<f64>,
    pub avg_delivery_manufacturing_cost: Option<f64>,
    pub avg_file_size_mb: Option<f64>,
    pub avg_delivery_cost: Option<f64>,
    pub printing_cost: Option<f64>,
    pub expanded_distribution_cost: Option<f64>,
    pub royalty: Option<f64>,
    pub currency: Option<String>,
    pub kenp_read: Option<i32>,
    pub paid_units: Option<i32>,
    pub free_units: Option<i32>,
    pub raw_data: serde_json::Value,
}

impl EstimatorRecord {
    pub fn format(&self) -> Option<BookFormat> {
        BookFormat::from_sheet_name(&self.sheet_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub sheet_name: String,
    pub row_index: i32,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EstimatorOutcome {
    #[serde(skip)]
    pub records: Vec<EstimatorRecord>,
    pub processed: usize,
    /// Rows dropped by the transaction-type filter.
    pub filtered: usize,
    pub errors: Vec<RowError>,
}

fn date_field(cell: &Cell, header: &str) -> Result<Option<Date>, String> {
    match parse_date(cell) {
        Some(d) => Ok(Some(d)),
        None => Err(format!(
            "Invalid date '{}' in column '{header}'",
            cell.as_text().unwrap_or_default()
        )),
    }
}

/// Map one estimator row by exact header name.
///
/// Fails only when a date column holds something that is not a date.
pub fn parse_estimator_row(
    headers: &[String],
    row: &[Cell],
    sheet_name: &str,
    row_index: i32,
) -> Result<EstimatorRecord, String> {
    let mut rec = EstimatorRecord {
        sheet_name: sheet_name.to_string(),
        row_index,
        raw_data: serde_json::Value::Array(row.iter().map(Cell::to_json).collect()),
        ..Default::default()
    };

    for (header, cell) in headers.iter().zip(row) {
        if cell.is_blank() {
            continue;
        }
        let text = || cell.as_text();
        match header.as_str() {
            "Royalty Date" | "Date" => rec.royalty_date = date_field(cell, header)?,
            "Order Date" => rec.order_date = date_field(cell, header)?,
            "Title" => rec.title = text(),
            "Author Name" => rec.author_name = text(),
            "ASIN/ISBN" | "ASIN" | "ISBN" => {
                let (asin, isbn) = classify_identifier(&text().unwrap_or_default());
                rec.asin = asin;
                rec.isbn = isbn;
            }
            "Marketplace" => rec.marketplace = text(),
            "Royalty Type" => rec.royalty_type = text(),
            "Transaction Type" => rec.transaction_type = text(),
            "Units Sold" => rec.units_sold = parse_integer(cell),
            "Units Refunded" => rec.units_refunded = parse_integer(cell),
            "Net Units Sold" => rec.net_units_sold = parse_integer(cell),
            "Avg. List Price without tax" => rec.avg_list_price = parse_decimal(cell),
            "Avg. Offer Price without tax" => rec.avg_offer_price = parse_decimal(cell),
            "Avg. Delivery/Manufacturing cost" => {
                rec.avg_delivery_manufacturing_cost = parse_decimal(cell)
            }
            "Avg. File Size (MB)" => rec.avg_file_size_mb = parse_decimal(cell),
            "Avg. Delivery Cost" => rec.avg_delivery_cost = parse_decimal(cell),
            "Printing Cost" => rec.printing_cost = parse_decimal(cell),
            "Expanded Distribution Cost" => rec.expanded_distribution_cost = parse_decimal(cell),
            "Royalty" => rec.royalty = parse_decimal(cell),
            "Currency" => rec.currency = text().map(|c| c.to_uppercase()),
            "Kindle Edition Normalized Page (KENP) Read" => rec.kenp_read = parse_integer(cell),
            "Paid Units" => rec.paid_units = parse_integer(cell),
            "Free Units" => rec.free_units = parse_integer(cell),
            _ => {}
        }
    }

    Ok(rec)
}

/// Walk the estimator sheets, keeping rows that pass the transaction filter.
pub fn process_estimator_workbook(workbook: &Workbook) -> EstimatorOutcome {
    let mut outcome = EstimatorOutcome::default();

    for sheet_name in ESTIMATOR_SHEETS {
        let Some(sheet) = workbook.sheet(sheet_name) else {
            continue;
        };
        let headers = sheet.headers();

        for (i, row) in sheet.data_rows().iter().enumerate() {
            if is_blank_row(row) {
                continue;
            }
            let row_index = i as i32 + 2;
            match parse_estimator_row(&headers, row, sheet_name, row_index) {
                Ok(rec) => {
                    if passes_estimator_filter(rec.transaction_type.as_deref()) {
                        outcome.records.push(rec);
                        outcome.processed += 1;
                    } else {
                        outcome.filtered += 1;
                    }
                }
                Err(message) => outcome.errors.push(RowError {
                    sheet_name: sheet_name.to_string(),
                    row_index,
                    message,
                }),
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdp::detection::ESTIMATOR_COMBINED_HEADERS;
    use crate::kdp::spreadsheet::test_support::sheet;
    use crate::kdp::spreadsheet::Sheet;

    fn combined_sales(rows: &[&[&str]]) -> Sheet {
        let mut all: Vec<&[&str]> = vec![ESTIMATOR_COMBINED_HEADERS];
        all.extend_from_slice(rows);
        let mut s = sheet("Combined Sales", &all);
        // Royalty column sits after the signature headers.
        s.rows[0].push(Cell::Text("Royalty".into()));
        s
    }

    #[test]
    fn filter_drops_other_transaction_types() {
        let mut combined = combined_sales(&[
            &["2025-01-05", "Tide", "Ada Quill", "B0TIDE0001", "Amazon.com", "70%", "", "2"],
            &["2025-01-06", "Tide", "Ada Quill", "B0TIDE0001", "Amazon.com", "70%", "Free - Promotion", "5"],
            &["2025-01-07", "Tide", "Ada Quill", "B0TIDE0001", "Amazon.com", "70%", "Refund", "1"],
        ]);
        combined.rows[1].push(Cell::Number(4.5));

        let wb = Workbook {
            sheets: vec![combined, sheet("eBook Royalty", &[&["Title"]])],
        };
        let outcome = process_estimator_workbook(&wb);
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.filtered, 1);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.records[0].royalty, Some(4.5));
        assert_eq!(outcome.records[0].row_index, 2);
        assert_eq!(outcome.records[0].asin.as_deref(), Some("B0TIDE0001"));
        assert_eq!(outcome.records[1].units_sold, Some(5));
    }

    #[test]
    fn bad_dates_are_row_errors() {
        let wb = Workbook {
            sheets: vec![combined_sales(&[&[
                "yesterday", "Tide", "Ada", "B0TIDE0001", "Amazon.de", "", "", "1",
            ]])],
        };
        let outcome = process_estimator_workbook(&wb);
        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].row_index, 2);
        assert!(outcome.errors[0].message.contains("yesterday"));
    }

    #[test]
    fn kenp_sheet_fields() {
        let kenp = sheet(
            "KENP Read",
            &[
                &[
                    "Date",
                    "Title",
                    "Author Name",
                    "ASIN",
                    "Marketplace",
                    "Kindle Edition Normalized Page (KENP) Read",
                ],
                &["45658", "Tide", "Ada Quill", "B0TIDE0001", "Amazon.com", "812"],
            ],
        );
        let headers = kenp.headers();
        let rec = parse_estimator_row(&headers, &kenp.rows[1], "KENP Read", 2).unwrap();
        assert_eq!(rec.kenp_read, Some(812));
        assert_eq!(
            rec.royalty_date,
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(rec.format(), None);
    }

    #[test]
    fn missing_sheets_are_skipped() {
        let outcome = process_estimator_workbook(&Workbook::default());
        assert_eq!(outcome, EstimatorOutcome::default());
    }
}
