//! Book formats sold through KDP.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const FORMAT_EBOOK: &str = "ebook";
pub const FORMAT_PAPERBACK: &str = "paperback";
pub const FORMAT_HARDCOVER: &str = "hardcover";

pub const VALID_FORMATS: &[&str] = &[FORMAT_EBOOK, FORMAT_PAPERBACK, FORMAT_HARDCOVER];

/// Manufacturing cost above which a print record is taken to be a hardcover.
pub const HARDCOVER_COST_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Ebook,
    Paperback,
    Hardcover,
}

impl BookFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ebook => FORMAT_EBOOK,
            Self::Paperback => FORMAT_PAPERBACK,
            Self::Hardcover => FORMAT_HARDCOVER,
        }
    }

    /// Interpret the free-text format column of a simple KDP sales report.
    ///
    /// Anything that does not look like an ebook or a hardcover is a paperback.
    pub fn from_report_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("ebook") || lower.contains("kindle") || lower.contains("digital") {
            Self::Ebook
        } else if lower.contains("hardcover")
            || lower.contains("hard cover")
            || lower.contains("hardback")
        {
            Self::Hardcover
        } else {
            Self::Paperback
        }
    }

    /// Derive a format from a KDP sheet name such as `"eBook Royalty"` or
    /// `"Paperback Royalty"`. Returns `None` for format-neutral sheets.
    pub fn from_sheet_name(sheet_name: &str) -> Option<Self> {
        let lower = sheet_name.to_lowercase();
        if lower.contains("ebook") || lower.contains("kindle") || lower.contains("digital") {
            Some(Self::Ebook)
        } else if lower.contains("paperback") {
            Some(Self::Paperback)
        } else if lower.contains("hardcover") {
            Some(Self::Hardcover)
        } else {
            None
        }
    }

    /// Classify a print record by its manufacturing cost.
    pub fn from_manufacturing_cost(cost: f64) -> Self {
        if cost > HARDCOVER_COST_THRESHOLD {
            Self::Hardcover
        } else {
            Self::Paperback
        }
    }
}

impl fmt::Display for BookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            FORMAT_EBOOK => Ok(Self::Ebook),
            FORMAT_PAPERBACK => Ok(Self::Paperback),
            FORMAT_HARDCOVER => Ok(Self::Hardcover),
            other => Err(CoreError::Validation(format!(
                "Invalid book format '{other}'. Must be one of: {}",
                VALID_FORMATS.join(", ")
            ))),
        }
    }
}
