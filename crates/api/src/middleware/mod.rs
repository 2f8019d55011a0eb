//! Request extractors.
//!
//! - [`auth::AuthUser`]: the caller, from a JWT Bearer token.
//! - [`rbac::RequireAdmin`]: callers with `admin` or `superadmin`.
//! - [`client::ClientInfo`]: caller address and user agent.

pub mod auth;
pub mod client;
pub mod rbac;
