//! In-memory workbook model and readers for KDP exports.
//!
//! KDP hands out reports as XLSX workbooks (Royalties Estimator, Prior
//! Month Royalties, Dashboard exports) or plain CSV. Both are read into the
//! same [`Workbook`] shape so the rest of the pipeline never cares which
//! container a file came in.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;

/// Name given to the single sheet of a CSV file.
pub const CSV_SHEET_NAME: &str = "Sheet1";

/// Extensions the workbook reader accepts (lowercase, without the dot).
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];
pub const CSV_EXTENSION: &str = "csv";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A single cell value. Excel dates surface as `Number` holding the serial
/// day count, exactly as KDP stores them.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text rendering, `None` for blank cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Empty => serde_json::Value::Null,
            Cell::Text(s) => serde_json::Value::String(s.clone()),
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Cell::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

/// Render whole numbers without a trailing `.0` so identifiers typed into
/// numeric cells (ISBNs) survive as text.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Header row rendered as trimmed strings. Blank header cells become `""`.
    pub fn headers(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| {
                row.iter()
                    .map(|c| c.as_text().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        if self.rows.len() > 1 {
            &self.rows[1..]
        } else {
            &[]
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Stand-in for cells past the end of a short row.
pub static EMPTY_CELL: Cell = Cell::Empty;

pub fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_blank)
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

/// Shape of a parsed workbook, stored on the import row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookSummary {
    pub total_sheets: usize,
    pub total_rows: usize,
    pub estimated_records: usize,
    pub sheets: Vec<SheetSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Every non-empty header across all sheets.
    pub fn all_headers(&self) -> Vec<String> {
        self.sheets
            .iter()
            .flat_map(|s| s.headers())
            .filter(|h| !h.is_empty())
            .collect()
    }

    pub fn summary(&self) -> WorkbookSummary {
        let sheets: Vec<SheetSummary> = self
            .sheets
            .iter()
            .map(|s| SheetSummary {
                name: s.name.clone(),
                headers: s.headers(),
                row_count: s.rows.len(),
            })
            .collect();
        WorkbookSummary {
            total_sheets: sheets.len(),
            total_rows: sheets.iter().map(|s| s.row_count).sum(),
            estimated_records: sheets.iter().map(|s| s.row_count.saturating_sub(1)).sum(),
            sheets,
        }
    }
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Lowercased extension of `file_name`, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

pub fn is_supported_file(file_name: &str) -> bool {
    file_extension(file_name).is_some_and(|ext| {
        ext == CSV_EXTENSION || SPREADSHEET_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Parse an uploaded report. The container is picked from the file extension.
pub fn read_workbook(bytes: &[u8], file_name: &str) -> Result<Workbook, SpreadsheetError> {
    let ext = file_extension(file_name)
        .ok_or_else(|| SpreadsheetError::UnsupportedFormat(file_name.to_string()))?;

    if ext == CSV_EXTENSION {
        read_csv(bytes)
    } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        read_excel(bytes)
    } else {
        Err(SpreadsheetError::UnsupportedFormat(ext))
    }
}

fn read_excel(bytes: &[u8]) -> Result<Workbook, SpreadsheetError> {
    let mut book = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let names = book.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = book.worksheet_range(&name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect())
            .collect();
        sheets.push(Sheet { name, rows });
    }
    Ok(Workbook { sheets })
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

fn read_csv(bytes: &[u8]) -> Result<Workbook, SpreadsheetError> {
    // Excel-exported CSVs often carry a UTF-8 BOM.
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(csv_cell).collect());
    }

    Ok(Workbook {
        sheets: vec![Sheet {
            name: CSV_SHEET_NAME.to_string(),
            rows,
        }],
    })
}

/// CSV cells are always text; numeric interpretation happens per column
/// during normalization.
fn csv_cell(field: &str) -> Cell {
    if field.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(field.to_string())
    }
}
