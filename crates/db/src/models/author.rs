//! Author entity model and DTOs.

use kdpdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `authors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Author {
    pub id: DbId,
    pub user_id: DbId,
    pub prefix: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    /// Rendered from the name parts on every write.
    pub full_name: String,
    pub biography: Option<String>,
    pub profile_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An author with the number of books linked to it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuthorWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub author: Author,
    pub book_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuthor {
    pub prefix: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub biography: Option<String>,
    pub profile_image_url: Option<String>,
}

/// DTO for updating an author. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAuthor {
    pub prefix: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub biography: Option<String>,
    pub profile_image_url: Option<String>,
    pub is_active: Option<bool>,
}
