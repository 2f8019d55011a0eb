//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Rows owned by a user are
//! always filtered by `user_id` so one user can never reach another's data.

pub mod audit_repo;
pub mod author_repo;
pub mod book_repo;
pub mod consolidated_sales_repo;
pub mod contributor_repo;
pub mod estimator_data_repo;
pub mod exchange_rate_repo;
pub mod kdp_import_data_repo;
pub mod kdp_import_repo;
pub mod master_book_repo;
pub mod project_repo;
pub mod sales_data_repo;
pub mod session_repo;
pub mod system_config_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use author_repo::AuthorRepo;
pub use book_repo::BookRepo;
pub use consolidated_sales_repo::ConsolidatedSalesRepo;
pub use contributor_repo::ContributorRepo;
pub use estimator_data_repo::EstimatorDataRepo;
pub use exchange_rate_repo::ExchangeRateRepo;
pub use kdp_import_data_repo::KdpImportDataRepo;
pub use kdp_import_repo::KdpImportRepo;
pub use master_book_repo::MasterBookRepo;
pub use project_repo::ProjectRepo;
pub use sales_data_repo::SalesDataRepo;
pub use session_repo::SessionRepo;
pub use system_config_repo::SystemConfigRepo;
pub use user_repo::UserRepo;
