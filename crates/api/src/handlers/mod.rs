//! Request handlers, one submodule per resource.
//!
//! Handlers extract the caller with [`AuthUser`](crate::middleware::auth::AuthUser)
//! (or [`RequireAdmin`](crate::middleware::rbac::RequireAdmin)), delegate to
//! the repositories in `kdpdesk_db` or to the [`engine`](crate::engine), and
//! map errors via [`AppError`](crate::error::AppError).

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod authors;
pub mod books;
pub mod currency;
pub mod dashboard;
pub mod kdp_imports;
pub mod master_books;
pub mod projects;
pub mod sales;
pub mod upload;
