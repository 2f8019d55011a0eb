//! Sanity checks over a batch of normalized records before they are stored.

use std::collections::HashSet;

use serde::Serialize;

use super::record::NormalizedRecord;

/// Below this ratio of unique titles to rows the file is probably not a
/// per-book report.
pub const MIN_UNIQUE_TITLE_RATIO: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn validate_import_data(records: &[NormalizedRecord]) -> ImportValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for rec in records {
        let row = format!("{} row {}", rec.sheet_name, rec.row_index);
        if rec.title.is_none() && rec.asin.is_none() && rec.isbn.is_none() {
            errors.push(format!("{row}: missing title, ASIN and ISBN"));
        }
        if rec.royalty.is_some_and(|r| r < 0.0) {
            warnings.push(format!("{row}: negative royalty"));
        }
        if rec.units_sold.is_some_and(|u| u < 0) {
            warnings.push(format!("{row}: negative units sold"));
        }
    }

    let unique_titles: HashSet<&str> = records
        .iter()
        .filter_map(|r| r.title.as_deref())
        .collect();
    if !records.is_empty()
        && (unique_titles.len() as f64) < records.len() as f64 * MIN_UNIQUE_TITLE_RATIO
    {
        warnings.push("Very few unique titles detected".to_string());
    }

    ImportValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}
