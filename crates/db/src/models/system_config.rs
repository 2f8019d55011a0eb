//! Admin-editable key/value settings.

use kdpdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SystemConfig {
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub updated_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSystemConfig {
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
}
