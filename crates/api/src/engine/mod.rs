//! KDP report processing.
//!
//! [`kdp_import`] runs an uploaded workbook through the ingestion pipeline
//! in a background task and records progress on the import row. The other
//! modules hold the follow-up steps that also run on demand from handlers:
//! master-book totals, catalogue reconciliation and payments consolidation.

pub mod book_sync;
pub mod consolidation;
pub mod kdp_import;
pub mod master_books;
