//! Book entity model and DTOs.

use kdpdesk_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `books` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Book {
    pub id: DbId,
    pub user_id: DbId,
    pub project_id: Option<DbId>,
    pub author_id: Option<DbId>,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub status: String,
    pub language: String,
    pub author_prefix: Option<String>,
    pub author_first_name: Option<String>,
    pub author_middle_name: Option<String>,
    pub author_last_name: Option<String>,
    pub author_suffix: Option<String>,
    pub primary_marketplace: String,
    pub format: String,
    pub isbn: Option<String>,
    /// Generated `PlaceHolder-########` value for books without a real ISBN.
    pub isbn_placeholder: Option<String>,
    pub asin: Option<String>,
    pub publication_date: Option<Date>,
    pub cover_image_url: Option<String>,
    pub total_sales: i32,
    pub total_revenue: f64,
    pub monthly_revenue: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new book.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBook {
    pub project_id: Option<DbId>,
    pub author_id: Option<DbId>,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    /// Defaults to `draft` if omitted.
    pub status: Option<String>,
    pub language: Option<String>,
    pub author_prefix: Option<String>,
    pub author_first_name: Option<String>,
    pub author_middle_name: Option<String>,
    pub author_last_name: Option<String>,
    pub author_suffix: Option<String>,
    pub primary_marketplace: Option<String>,
    /// Defaults to `ebook` if omitted.
    pub format: Option<String>,
    pub isbn: Option<String>,
    /// Filled by the handler; clients cannot choose it.
    #[serde(skip)]
    pub isbn_placeholder: Option<String>,
    pub asin: Option<String>,
    pub publication_date: Option<Date>,
    pub cover_image_url: Option<String>,
}

/// DTO for updating an existing book. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    pub project_id: Option<DbId>,
    pub author_id: Option<DbId>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub status: Option<String>,
    pub language: Option<String>,
    pub author_prefix: Option<String>,
    pub author_first_name: Option<String>,
    pub author_middle_name: Option<String>,
    pub author_last_name: Option<String>,
    pub author_suffix: Option<String>,
    pub primary_marketplace: Option<String>,
    pub format: Option<String>,
    pub isbn: Option<String>,
    pub asin: Option<String>,
    pub publication_date: Option<Date>,
    pub cover_image_url: Option<String>,
}

/// Query filters for the book list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub project_id: Option<DbId>,
    pub author_id: Option<DbId>,
    pub format: Option<String>,
    pub status: Option<String>,
}
