//! Row normalization: typed values out of loosely formatted KDP cells.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use super::columns::{ColumnMapping, ColumnTarget, KdpField};
use super::record::NormalizedRecord;
use super::spreadsheet::{Cell, EMPTY_CELL};
use crate::format::BookFormat;
use crate::types::Date;

/// Day zero of the Excel 1900 date system (serial 1 = 1900-01-01, with
/// Lotus' phantom leap day folded in).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Largest serial Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid regex"));
static US_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid regex"));
static YEAR_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").expect("valid regex"));
static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid regex"));
static LEADING_INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Scalar parsers
// ---------------------------------------------------------------------------

pub fn excel_serial_to_date(serial: f64) -> Option<Date> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Accepts Excel serials, `YYYY-MM-DD` (optionally followed by a time),
/// US-ordered `M/D/YYYY` and `YYYY-MM` (first of the month).
pub fn parse_date(cell: &Cell) -> Option<Date> {
    match cell {
        Cell::Number(n) => excel_serial_to_date(*n),
        Cell::Text(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

pub fn parse_date_text(s: &str) -> Option<Date> {
    if let Some(c) = YEAR_MONTH_RE.captures(s) {
        return NaiveDate::from_ymd_opt(c[1].parse().ok()?, c[2].parse().ok()?, 1);
    }
    if let Some(c) = ISO_DATE_RE.captures(s) {
        return NaiveDate::from_ymd_opt(
            c[1].parse().ok()?,
            c[2].parse().ok()?,
            c[3].parse().ok()?,
        );
    }
    if let Some(c) = US_DATE_RE.captures(s) {
        return NaiveDate::from_ymd_opt(
            c[3].parse().ok()?,
            c[1].parse().ok()?,
            c[2].parse().ok()?,
        );
    }
    None
}

/// Strip thousands separators, currency symbols and surrounding space.
/// Drop thousands separators and a currency symbol, which may follow the
/// sign (`"-$5.00"`).
fn clean_numeric_text(s: &str) -> String {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix(['-', '+']) {
        Some(rest) => (&s[..1], rest.trim_start()),
        None => ("", s),
    };
    let digits = rest
        .trim_start_matches(|c: char| "$€£¥₹".contains(c))
        .replace(',', "");
    format!("{sign}{}", digits.trim())
}

/// Integer value of a cell. Numbers truncate toward zero; text is read up to
/// the first non-digit, so `"12 units"` is `12`.
pub fn parse_integer(cell: &Cell) -> Option<i32> {
    match cell {
        Cell::Number(n) if n.is_finite() => {
            let t = n.trunc();
            (t >= i32::MIN as f64 && t <= i32::MAX as f64).then_some(t as i32)
        }
        Cell::Text(s) => {
            let cleaned = clean_numeric_text(s);
            LEADING_INTEGER_RE
                .find(&cleaned)
                .and_then(|m| m.as_str().parse().ok())
        }
        _ => None,
    }
}

/// Decimal value of a cell, tolerant of `"$1,234.50"` style text.
pub fn parse_decimal(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => {
            let cleaned = clean_numeric_text(s);
            LEADING_NUMBER_RE
                .find(&cleaned)
                .and_then(|m| m.as_str().parse().ok())
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Whether a combined `ASIN/ISBN` value is an ISBN: 13 digits, or 9 digits
/// plus a check digit/`X`, never starting with `B`. Hyphens are ignored.
pub fn is_isbn(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| *c != '-' && *c != ' ').collect();
    if compact.starts_with(['B', 'b']) {
        return false;
    }
    let bytes = compact.as_bytes();
    match bytes.len() {
        13 => bytes.iter().all(u8::is_ascii_digit),
        10 => {
            bytes[..9].iter().all(u8::is_ascii_digit)
                && (bytes[9].is_ascii_digit() || bytes[9] == b'X' || bytes[9] == b'x')
        }
        _ => false,
    }
}

/// Split a combined identifier into `(asin, isbn)`.
pub fn classify_identifier(value: &str) -> (Option<String>, Option<String>) {
    let value = value.trim();
    if value.is_empty() {
        (None, None)
    } else if is_isbn(value) {
        (None, Some(value.to_string()))
    } else {
        (Some(value.to_string()), None)
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

fn set_once<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Format for a record: the sheet name decides when it can, otherwise the
/// record's own content (KENP reads or file size mean ebook, a manufacturing
/// cost means print).
pub fn infer_format(record: &NormalizedRecord) -> Option<BookFormat> {
    if let Some(format) = BookFormat::from_sheet_name(&record.sheet_name) {
        return Some(format);
    }
    if record.kenp_read.is_some_and(|k| k > 0) || record.file_size.is_some_and(|s| s != 0.0) {
        return Some(BookFormat::Ebook);
    }
    record
        .manufacturing_cost
        .filter(|c| *c != 0.0)
        .map(BookFormat::from_manufacturing_cost)
}

/// Convert one spreadsheet row. `row_index` is the 1-based sheet row.
pub fn normalize_row(
    row: &[Cell],
    mapping: &ColumnMapping,
    sheet_name: &str,
    row_index: i32,
) -> NormalizedRecord {
    let mut rec = NormalizedRecord {
        sheet_name: sheet_name.to_string(),
        row_index,
        ..Default::default()
    };

    for (i, header) in mapping.headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        let cell = row.get(i).unwrap_or(&EMPTY_CELL);
        rec.raw_data.insert(header.clone(), cell.to_json());
    }

    for (i, cell) in row.iter().enumerate() {
        if cell.is_blank() {
            continue;
        }
        match mapping.target(i) {
            ColumnTarget::Ignored => {}
            ColumnTarget::Other(name) => {
                if let Some(text) = cell.as_text() {
                    rec.extra_fields
                        .entry(name.clone())
                        .or_insert(serde_json::Value::String(text));
                }
            }
            ColumnTarget::Field(field) => apply_field(&mut rec, *field, cell),
        }
    }

    if rec.units_sold.is_none() {
        rec.units_sold = rec.paid_units;
    }
    rec.format = infer_format(&rec);
    rec
}

fn apply_field(rec: &mut NormalizedRecord, field: KdpField, cell: &Cell) {
    let text = || cell.as_text();
    match field {
        KdpField::AsinOrIsbn => {
            if let Some(value) = text() {
                let (asin, isbn) = classify_identifier(&value);
                set_once(&mut rec.asin, asin);
                set_once(&mut rec.isbn, isbn);
            }
        }
        KdpField::Asin => set_once(&mut rec.asin, text()),
        KdpField::Isbn => set_once(&mut rec.isbn, text()),
        KdpField::Title => set_once(&mut rec.title, text()),
        KdpField::AuthorName => set_once(&mut rec.author_name, text()),
        KdpField::Marketplace => set_once(&mut rec.marketplace, text()),
        KdpField::Currency => set_once(&mut rec.currency, text().map(|c| c.to_uppercase())),
        KdpField::RoyaltyType => set_once(&mut rec.royalty_type, text()),
        KdpField::TransactionType => set_once(&mut rec.transaction_type, text()),
        KdpField::PaymentStatus => set_once(&mut rec.payment_status, text()),
        KdpField::SalesDate => set_once(&mut rec.sales_date, parse_date(cell)),
        KdpField::UnitsSold => set_once(&mut rec.units_sold, parse_integer(cell)),
        KdpField::UnitsRefunded => set_once(&mut rec.units_refunded, parse_integer(cell)),
        KdpField::NetUnitsSold => set_once(&mut rec.net_units_sold, parse_integer(cell)),
        KdpField::PaidUnits => set_once(&mut rec.paid_units, parse_integer(cell)),
        KdpField::FreeUnits => set_once(&mut rec.free_units, parse_integer(cell)),
        KdpField::KenpRead => set_once(&mut rec.kenp_read, parse_integer(cell)),
        KdpField::ListPrice => set_once(&mut rec.list_price, parse_decimal(cell)),
        KdpField::OfferPrice => set_once(&mut rec.offer_price, parse_decimal(cell)),
        KdpField::Royalty => set_once(&mut rec.royalty, parse_decimal(cell)),
        KdpField::FileSize => set_once(&mut rec.file_size, parse_decimal(cell)),
        KdpField::DeliveryCost => set_once(&mut rec.delivery_cost, parse_decimal(cell)),
        KdpField::ManufacturingCost => {
            set_once(&mut rec.manufacturing_cost, parse_decimal(cell))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdp::columns::create_column_mapping;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn ymd(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn excel_serials() {
        assert_eq!(excel_serial_to_date(45658.0), Some(ymd(2025, 1, 1)));
        assert_eq!(excel_serial_to_date(45658.75), Some(ymd(2025, 1, 1)));
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn text_dates() {
        assert_eq!(parse_date_text("2025-03-14"), Some(ymd(2025, 3, 14)));
        assert_eq!(parse_date_text("2025-03-14T10:00:00Z"), Some(ymd(2025, 3, 14)));
        assert_eq!(parse_date_text("3/14/2025"), Some(ymd(2025, 3, 14)));
        assert_eq!(parse_date_text("2025-03"), Some(ymd(2025, 3, 1)));
        assert_eq!(parse_date_text("14.03.2025"), None);
        assert_eq!(parse_date_text("2025-13-01"), None);
    }

    #[test]
    fn integers() {
        assert_eq!(parse_integer(&Cell::Number(12.9)), Some(12));
        assert_eq!(parse_integer(&text("1,204")), Some(1204));
        assert_eq!(parse_integer(&text("-3")), Some(-3));
        assert_eq!(parse_integer(&text("12 units")), Some(12));
        assert_eq!(parse_integer(&text("n/a")), None);
        assert_eq!(parse_integer(&Cell::Empty), None);
    }

    #[test]
    fn decimals() {
        assert_eq!(parse_decimal(&text("$1,234.50")), Some(1234.5));
        assert_eq!(parse_decimal(&text("-0.35")), Some(-0.35));
        assert_eq!(parse_decimal(&text("2.99 USD")), Some(2.99));
        assert_eq!(parse_decimal(&Cell::Number(4.2)), Some(4.2));
        assert_eq!(parse_decimal(&text("abc")), None);
    }

    #[test]
    fn currency_symbol_after_sign() {
        assert_eq!(parse_decimal(&text("-$5.00")), Some(-5.0));
        assert_eq!(parse_decimal(&text("- £1,200.25")), Some(-1200.25));
        assert_eq!(parse_decimal(&text("+€3")), Some(3.0));
        assert_eq!(parse_integer(&text("-$12")), Some(-12));
    }

    #[test]
    fn identifiers() {
        assert!(is_isbn("9781234567897"));
        assert!(is_isbn("978-1-234-56789-7"));
        assert!(is_isbn("123456789X"));
        assert!(!is_isbn("B0ABCDEFGH"));
        assert!(!is_isbn("B012345678"));
        assert_eq!(
            classify_identifier("B0ABCDEFGH"),
            (Some("B0ABCDEFGH".into()), None)
        );
        assert_eq!(
            classify_identifier(" 9781234567897 "),
            (None, Some("9781234567897".into()))
        );
        assert_eq!(classify_identifier(""), (None, None));
    }

    #[test]
    fn normalizes_estimator_row() {
        let headers: Vec<String> = [
            "Royalty Date",
            "Title",
            "Author Name",
            "ASIN/ISBN",
            "Marketplace",
            "Net Units Sold",
            "Royalty",
            "Currency",
            "Expanded Distribution Cost",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let mapping = create_column_mapping(&headers);
        let row = vec![
            text("2025-02-01"),
            text("  Night Garden "),
            text("Ada Quill"),
            text("9781234567897"),
            text("Amazon.com"),
            Cell::Number(3.0),
            Cell::Number(7.47),
            text("usd"),
            Cell::Number(0.5),
        ];

        let rec = normalize_row(&row, &mapping, "Paperback Royalty", 2);
        assert_eq!(rec.row_index, 2);
        assert_eq!(rec.sales_date, Some(ymd(2025, 2, 1)));
        assert_eq!(rec.title.as_deref(), Some("Night Garden"));
        assert_eq!(rec.isbn.as_deref(), Some("9781234567897"));
        assert_eq!(rec.asin, None);
        assert_eq!(rec.net_units_sold, Some(3));
        assert_eq!(rec.units_sold, None);
        assert_eq!(rec.royalty, Some(7.47));
        assert_eq!(rec.currency.as_deref(), Some("USD"));
        assert_eq!(rec.format, Some(BookFormat::Paperback));
        assert_eq!(rec.raw_data.len(), 9);
        assert_eq!(
            rec.extra_fields["expanded_distribution_cost"],
            serde_json::json!("0.5")
        );
    }

    #[test]
    fn short_rows_and_paid_units() {
        let headers: Vec<String> = ["Title", "Paid Units", "KENP Read", "Royalty"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = create_column_mapping(&headers);
        let row = vec![text("Tide"), text("4"), text("1200")];

        let rec = normalize_row(&row, &mapping, "Sheet1", 5);
        assert_eq!(rec.units_sold, Some(4));
        assert_eq!(rec.kenp_read, Some(1200));
        assert_eq!(rec.royalty, None);
        assert_eq!(rec.format, Some(BookFormat::Ebook));
        assert_eq!(rec.raw_data["Royalty"], serde_json::Value::Null);
    }

    #[test]
    fn format_from_manufacturing_cost() {
        let rec = NormalizedRecord {
            sheet_name: "Combined Sales".into(),
            manufacturing_cost: Some(6.1),
            ..Default::default()
        };
        assert_eq!(infer_format(&rec), Some(BookFormat::Hardcover));

        let rec = NormalizedRecord {
            sheet_name: "Combined Sales".into(),
            ..Default::default()
        };
        assert_eq!(infer_format(&rec), None);
    }
}
