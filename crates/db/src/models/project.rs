//! Project entity model and DTOs.

use kdpdesk_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub status: String,
    pub language: String,
    pub primary_marketplace: String,
    pub publication_date: Option<Date>,
    pub cover_image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A project with aggregate figures over its books.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,
    pub book_count: i64,
    pub total_sales: i64,
    pub total_revenue: f64,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    /// Defaults to `draft` if omitted.
    pub status: Option<String>,
    pub language: Option<String>,
    pub primary_marketplace: Option<String>,
    pub publication_date: Option<Date>,
    pub cover_image_url: Option<String>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub status: Option<String>,
    pub language: Option<String>,
    pub primary_marketplace: Option<String>,
    pub publication_date: Option<Date>,
    pub cover_image_url: Option<String>,
}
