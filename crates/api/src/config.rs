//! Environment-driven server configuration.
//!
//! `.env` is loaded by `main` before [`ServerConfig::from_env`] runs, so the
//! same variables work from a file or the process environment.

use std::fmt::Display;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

pub const DEFAULT_EXCHANGE_RATE_API_URL: &str = "https://api.exchangerate-api.com/v4/latest";

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Grace period for background tasks once shutdown starts.
    pub shutdown_timeout_secs: u64,
    /// Largest accepted report upload, in bytes.
    pub max_upload_bytes: usize,
    /// Provider endpoint; the base currency code is appended as a path segment.
    pub exchange_rate_api_url: String,
    pub exchange_rate_refresh_hours: u64,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Read every setting from the environment.
    ///
    /// | Env Var                       | Default                                      |
    /// |-------------------------------|----------------------------------------------|
    /// | `HOST`                        | `0.0.0.0`                                    |
    /// | `PORT`                        | `3000`                                       |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` (comma-separated)    |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                                         |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                                         |
    /// | `MAX_UPLOAD_MB`               | `50`                                         |
    /// | `EXCHANGE_RATE_API_URL`       | `https://api.exchangerate-api.com/v4/latest` |
    /// | `EXCHANGE_RATE_REFRESH_HOURS` | `24` (at least 1)                            |
    /// | `JWT_SECRET`                  | required                                     |
    /// | `JWT_ACCESS_EXPIRY_MINS`      | `15`                                         |
    /// | `JWT_REFRESH_EXPIRY_DAYS`     | `7`                                          |
    ///
    /// # Panics
    ///
    /// On a value that does not parse, or a missing or empty `JWT_SECRET`.
    /// Both are fatal at startup.
    pub fn from_env() -> Self {
        let max_upload_mb: usize = env_or("MAX_UPLOAD_MB", 50);
        let refresh_hours: u64 = env_or("EXCHANGE_RATE_REFRESH_HOURS", 24);

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins: split_origins(&env_or("CORS_ORIGINS", DEFAULT_CORS_ORIGINS.to_string())),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            exchange_rate_api_url: env_or(
                "EXCHANGE_RATE_API_URL",
                DEFAULT_EXCHANGE_RATE_API_URL.to_string(),
            ),
            exchange_rate_refresh_hours: refresh_hours.max(1),
            jwt: jwt_from_env(),
        }
    }
}

fn jwt_from_env() -> JwtConfig {
    let secret = std::env::var("JWT_SECRET").unwrap_or_default();
    assert!(!secret.trim().is_empty(), "JWT_SECRET must be set and non-empty");

    JwtConfig {
        secret,
        access_ttl_mins: env_or("JWT_ACCESS_EXPIRY_MINS", 15),
        refresh_ttl_days: env_or("JWT_REFRESH_EXPIRY_DAYS", 7),
    }
}

/// `name` parsed as `T`, or `default` when unset.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} has an invalid value {raw:?}: {e}")),
        Err(_) => default,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
