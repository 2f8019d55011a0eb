use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kdpdesk_core::error::CoreError;
use kdpdesk_core::kdp::sales_report::SalesReportError;
use kdpdesk_core::kdp::spreadsheet::SpreadsheetError;
use kdpdesk_core::types::DbId;
use serde::Serialize;

/// Error returned by every handler.
///
/// Rendered as `{ "error": <message>, "code": <CODE> }`. Server-side
/// failures are logged and answered with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 404 for lookups not keyed by a numeric id (ASINs, for one).
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 404 for a user-scoped lookup by id.
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        AppError::Core(CoreError::NotFound { entity, id })
    }
}

impl From<SpreadsheetError> for AppError {
    fn from(err: SpreadsheetError) -> Self {
        AppError::BadRequest(format!("Could not read spreadsheet: {err}"))
    }
}

impl From<SalesReportError> for AppError {
    fn from(err: SalesReportError) -> Self {
        AppError::Core(CoreError::Validation(err.to_string()))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = match self {
            AppError::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
            }
            AppError::Core(CoreError::Conflict(msg)) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::Core(CoreError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
            }
            AppError::Core(CoreError::Forbidden(msg)) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            AppError::Core(CoreError::Internal(msg)) | AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
            AppError::Database(err) => classify_sqlx_error(&err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
        };

        (status, Json(ErrorBody { error, code })).into_response()
    }
}

/// Postgres error codes surfaced to clients.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// `RowNotFound` is a 404, a unique violation on a `uq_*` constraint a 409,
/// a foreign-key violation a 400. Anything else is logged and hidden.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            )
        }
        sqlx::Error::Database(db_err) => db_err,
        other => {
            tracing::error!(error = %other, "Database error");
            return internal();
        }
    };

    let constraint = db_err.constraint().unwrap_or("unknown");
    match db_err.code().as_deref() {
        Some(UNIQUE_VIOLATION) if constraint.starts_with("uq_") => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        Some(FOREIGN_KEY_VIOLATION) => (
            StatusCode::BAD_REQUEST,
            "INVALID_REFERENCE",
            format!("Referenced record does not exist ({constraint})"),
        ),
        _ => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}
