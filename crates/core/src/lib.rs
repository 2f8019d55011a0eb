//! Domain logic for the KDP publishing dashboard.
//!
//! Everything in this crate is pure: no database access, no async. The
//! `db` crate persists what these modules compute and the `api` crate
//! wires them to HTTP.

pub mod authors;
pub mod currency;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod import_status;
pub mod isbn;
pub mod kdp;
pub mod roles;
pub mod types;
pub mod validation;
