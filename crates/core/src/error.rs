use crate::types::DbId;

/// Domain-level error shared by every crate in the workspace.
///
/// The API layer maps each variant onto an HTTP status code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A row the caller asked for does not exist (or is not theirs).
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
