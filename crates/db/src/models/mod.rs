//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod audit;
pub mod author;
pub mod book;
pub mod consolidated_sales;
pub mod contributor;
pub mod estimator_data;
pub mod exchange_rate;
pub mod kdp_import;
pub mod kdp_import_data;
pub mod master_book;
pub mod project;
pub mod sales_data;
pub mod session;
pub mod system_config;
pub mod user;
