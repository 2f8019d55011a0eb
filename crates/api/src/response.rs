//! Shared response envelope types for API handlers.
//!
//! List and detail endpoints answer with `{ "data": ... }`; use
//! [`DataResponse`] rather than ad-hoc `json!` bodies.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
