//! KDP report ingestion: reading workbooks, recognising report types,
//! normalizing rows and rolling them up into per-book totals.

pub mod aggregation;
pub mod columns;
pub mod dedup;
pub mod detection;
pub mod estimator;
pub mod normalize;
pub mod reconcile;
pub mod record;
pub mod sales_report;
pub mod spreadsheet;
pub mod transactions;
pub mod validation;
