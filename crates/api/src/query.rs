//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Default page size when `?limit=` is absent.
pub const DEFAULT_LIMIT: i64 = 50;
/// Upper bound on any page size.
pub const MAX_LIMIT: i64 = 500;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_clamped() {
        let params = PaginationParams { limit: Some(10_000), offset: Some(-5) };
        assert_eq!(params.limit(), MAX_LIMIT);
        assert_eq!(params.offset(), 0);
        assert_eq!(PaginationParams::default().limit(), DEFAULT_LIMIT);
    }
}
