//! Refresh-token sessions.

use kdpdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// One issued refresh token. Only its SHA-256 hash is stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserSession {
    /// Neither revoked nor past `expires_at`.
    pub fn is_usable(&self, now: Timestamp) -> bool {
        !self.is_revoked && self.expires_at > now
    }
}

/// A session to open at login, registration or token refresh.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
