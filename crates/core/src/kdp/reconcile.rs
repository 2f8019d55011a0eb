//! Reconcile imported sales rows against the user's book catalogue.
//!
//! Rows are grouped by identifier (ASIN, else ISBN). Each group becomes a
//! [`BookPlan`] describing the book it implies; the API then creates or
//! updates catalogue books from the plans.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::estimator::EstimatorRecord;
use super::record::NormalizedRecord;
use crate::authors::{parse_author_name, ParsedAuthorName};
use crate::format::BookFormat;

/// Marketplace assigned to auto-created books when the report has none.
pub const DEFAULT_MARKETPLACE: &str = "Amazon.com";
pub const DEFAULT_LANGUAGE: &str = "English";

/// The subset of a sales row that matters for reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    pub asin: Option<String>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub marketplace: Option<String>,
    pub sheet_name: String,
}

impl From<&NormalizedRecord> for SourceRow {
    fn from(rec: &NormalizedRecord) -> Self {
        Self {
            asin: rec.asin.clone(),
            isbn: rec.isbn.clone(),
            title: rec.title.clone(),
            author_name: rec.author_name.clone(),
            marketplace: rec.marketplace.clone(),
            sheet_name: rec.sheet_name.clone(),
        }
    }
}

impl From<&EstimatorRecord> for SourceRow {
    fn from(rec: &EstimatorRecord) -> Self {
        Self {
            asin: rec.asin.clone(),
            isbn: rec.isbn.clone(),
            title: rec.title.clone(),
            author_name: rec.author_name.clone(),
            marketplace: rec.marketplace.clone(),
            sheet_name: rec.sheet_name.clone(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl SourceRow {
    pub fn identifier(&self) -> Option<&str> {
        non_empty(&self.asin).or_else(|| non_empty(&self.isbn))
    }
}

/// Rows grouped by identifier, in identifier order.
#[derive(Debug, Clone, Default)]
pub struct IdentifierGroups {
    pub groups: BTreeMap<String, Vec<SourceRow>>,
    /// Rows with neither ASIN nor ISBN.
    pub skipped: usize,
}

pub fn group_by_identifier<I>(rows: I) -> IdentifierGroups
where
    I: IntoIterator<Item = SourceRow>,
{
    let mut out = IdentifierGroups::default();
    for row in rows {
        match row.identifier().map(str::to_string) {
            Some(id) => out.groups.entry(id).or_default().push(row),
            None => out.skipped += 1,
        }
    }
    out
}

/// Heuristic used when only a bare identifier is known: ASINs are ten
/// characters and usually start with `B0`.
pub fn looks_like_asin(identifier: &str) -> bool {
    identifier.len() == 10 || identifier.to_uppercase().starts_with("B0")
}

/// The book a group of rows describes.
#[derive(Debug, Clone, PartialEq)]
pub struct BookPlan {
    pub identifier: String,
    pub asin: Option<String>,
    pub isbn: Option<String>,
    pub title: String,
    pub author: ParsedAuthorName,
    pub author_display: String,
    pub format: BookFormat,
    pub marketplace: Option<String>,
}

/// Build a plan from the group's first row. Fails when that row lacks a
/// title or an author.
pub fn plan_book(identifier: &str, rows: &[SourceRow]) -> Result<BookPlan, String> {
    let primary = rows
        .first()
        .ok_or_else(|| format!("Book {identifier}: no rows"))?;

    let title = non_empty(&primary.title);
    let author = primary
        .author_name
        .as_deref()
        .and_then(parse_author_name);
    let (Some(title), Some(author)) = (title, author) else {
        return Err(format!("Book {identifier}: Missing title or author name"));
    };

    Ok(BookPlan {
        identifier: identifier.to_string(),
        asin: non_empty(&primary.asin).map(str::to_string),
        isbn: non_empty(&primary.isbn).map(str::to_string),
        title: title.to_string(),
        author_display: primary.author_name.as_deref().unwrap_or_default().trim().to_string(),
        author,
        format: BookFormat::from_sheet_name(&primary.sheet_name).unwrap_or(BookFormat::Ebook),
        marketplace: non_empty(&primary.marketplace).map(str::to_string),
    })
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AutoCreationOptions {
    #[serde(default)]
    pub update_existing_books: bool,
    /// Find or create an `authors` row for each book and link it.
    #[serde(default)]
    pub link_authors: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookCreationResult {
    pub books_created: usize,
    pub books_updated: usize,
    pub authors_created: usize,
    pub authors_updated: usize,
    pub errors: Vec<String>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportPreview {
    pub total_books: usize,
    pub existing_books: usize,
    pub new_books: usize,
    pub books_without_id: usize,
    pub total_sales_data: usize,
    pub duplicate_sales_data: usize,
    pub missing_author_data: usize,
}

impl ImportPreview {
    /// Preview counts for `rows`. `is_existing` answers whether the user
    /// already has a book with the given identifier.
    pub fn build<F>(rows: &[SourceRow], duplicate_sales_data: usize, mut is_existing: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        let missing_author_data = rows
            .iter()
            .filter(|r| r.identifier().is_some() && non_empty(&r.author_name).is_none())
            .count();
        let groups = group_by_identifier(rows.iter().cloned());
        let existing_books = groups.groups.keys().filter(|id| is_existing(id)).count();

        ImportPreview {
            total_books: groups.groups.len(),
            existing_books,
            new_books: groups.groups.len() - existing_books,
            books_without_id: groups.skipped,
            total_sales_data: rows.len(),
            duplicate_sales_data,
            missing_author_data,
        }
    }
}
