//! Book contributor model and DTOs.

use kdpdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `book_contributors` table. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Contributor {
    pub id: DbId,
    pub book_id: DbId,
    pub name: String,
    /// Free text such as `author`, `editor`, `illustrator`.
    pub role: String,
    pub prefix: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContributor {
    /// Rendered from the name parts when omitted.
    pub name: Option<String>,
    pub role: String,
    pub prefix: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
}
