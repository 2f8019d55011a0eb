//! Background processing of one uploaded KDP report.
//!
//! The upload handler creates the `kdp_imports` row and hands the parsed
//! workbook to [`ImportProcessor::spawn`]. Every step writes progress to the
//! import row, which clients poll. A database error anywhere in the run
//! marks the import `failed`; row-level problems only land in the error log.
//!
//! Runs are tracked so shutdown can wait for them. One cut off by a restart
//! is failed by [`recover_interrupted`] on the next start.

use std::collections::{BTreeMap, HashSet};

use kdpdesk_core::import_status::{progress_for_rows, ImportStage};
use kdpdesk_core::kdp::validation::validate_import_data;
use kdpdesk_core::kdp::columns::create_column_mapping;
use kdpdesk_core::kdp::dedup::find_duplicates;
use kdpdesk_core::kdp::detection::KdpFileType;
use kdpdesk_core::kdp::estimator::{process_estimator_workbook, EstimatorOutcome};
use kdpdesk_core::kdp::normalize::normalize_row;
use kdpdesk_core::kdp::record::NormalizedRecord;
use kdpdesk_core::kdp::spreadsheet::{is_blank_row, Workbook};
use kdpdesk_core::kdp::transactions::transaction_stats;
use kdpdesk_core::types::DbId;
use kdpdesk_db::models::kdp_import::ImportCompletion;
use kdpdesk_db::repositories::{EstimatorDataRepo, KdpImportDataRepo, KdpImportRepo};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tokio_util::task::TaskTracker;

use crate::engine::master_books;
use crate::rates::current_rate_table;

pub const INTERRUPTED_MESSAGE: &str = "Import interrupted by a server restart";

/// Final figures of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub saved: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
    pub estimator_saved: usize,
}

pub struct ImportProcessor {
    pool: PgPool,
    import_id: DbId,
    user_id: DbId,
    file_type: KdpFileType,
}

impl ImportProcessor {
    pub fn new(pool: PgPool, import_id: DbId, user_id: DbId, file_type: KdpFileType) -> Self {
        Self {
            pool,
            import_id,
            user_id,
            file_type,
        }
    }

    /// Run the import on its own task, registered with `tracker`.
    pub fn spawn(self, tracker: &TaskTracker, workbook: Workbook) {
        tracker.spawn(async move {
            self.run(workbook).await;
        });
    }

    /// Process the workbook to completion, marking the import `failed` on
    /// any fatal error. Returns the report when the import completed.
    pub async fn run(&self, workbook: Workbook) -> Option<ImportReport> {
        tracing::info!(import_id = self.import_id, user_id = self.user_id, "Import started");

        match self.process(&workbook).await {
            Ok(report) => {
                tracing::info!(
                    import_id = self.import_id,
                    saved = report.saved,
                    duplicates = report.duplicates,
                    errors = report.errors.len(),
                    "Import completed",
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!(import_id = self.import_id, error = %e, "Import failed");
                if let Err(e) = KdpImportRepo::fail(&self.pool, self.import_id, &e.to_string()).await
                {
                    tracing::error!(
                        import_id = self.import_id,
                        error = %e,
                        "Failed to mark import as failed",
                    );
                }
                None
            }
        }
    }

    async fn process(&self, workbook: &Workbook) -> Result<ImportReport, sqlx::Error> {
        KdpImportRepo::mark_processing(&self.pool, self.import_id).await?;
        self.report(&ImportStage::Initializing, 0).await?;

        let total_rows: usize = workbook
            .sheets
            .iter()
            .filter(|s| self.file_type.normalizes_sheet(&s.name))
            .map(|s| s.data_rows().len())
            .sum();
        let mut rows_seen = 0usize;
        let mut records: Vec<NormalizedRecord> = Vec::new();
        let mut mapping_config = BTreeMap::new();
        let mut errors: Vec<String> = Vec::new();

        for sheet in &workbook.sheets {
            if !self.file_type.normalizes_sheet(&sheet.name) {
                tracing::debug!(import_id = self.import_id, sheet = %sheet.name, "Skipping summary sheet");
                continue;
            }
            let stage = ImportStage::ProcessingSheet {
                sheet: sheet.name.clone(),
                progress: progress_for_rows(rows_seen, total_rows),
            };
            self.report(&stage, records.len()).await?;

            if sheet.is_empty() {
                tracing::debug!(import_id = self.import_id, sheet = %sheet.name, "Skipping empty sheet");
                continue;
            }

            let mapping = create_column_mapping(&sheet.headers());
            for (pos, row) in sheet.data_rows().iter().enumerate() {
                rows_seen += 1;
                if is_blank_row(row) {
                    continue;
                }
                records.push(normalize_row(row, &mapping, &sheet.name, pos as i32 + 2));
            }
            mapping_config.insert(sheet.name.clone(), mapping.to_config());
        }

        let estimator = if self.file_type == KdpFileType::RoyaltiesEstimator {
            let outcome = self.store_estimator_rows(workbook).await?;
            errors.extend(outcome.errors.iter().map(|e| {
                format!(
                    "Error processing row {} in sheet {}: {}",
                    e.row_index, e.sheet_name, e.message
                )
            }));
            Some(outcome)
        } else {
            None
        };

        let validation = validate_import_data(&records);
        errors.extend(validation.errors.iter().cloned());

        self.report(&ImportStage::CheckingDuplicates, records.len()).await?;
        let existing = KdpImportDataRepo::duplicate_keys_for_user(&self.pool, self.user_id).await?;
        let duplicate_idx: HashSet<usize> = find_duplicates(&existing, &records).into_iter().collect();
        let fresh: Vec<NormalizedRecord> = records
            .iter()
            .enumerate()
            .filter(|(i, _)| !duplicate_idx.contains(i))
            .map(|(_, rec)| rec.clone())
            .collect();

        self.report(&ImportStage::Saving, fresh.len()).await?;
        let saved = if fresh.is_empty() {
            0
        } else {
            KdpImportDataRepo::insert_batch(&self.pool, self.import_id, self.user_id, &fresh).await?
                as usize
        };

        if saved > 0 {
            self.report(&ImportStage::UpdatingMasterBooks, saved).await?;
            if let Err(e) =
                master_books::update_from_import(&self.pool, self.user_id, self.import_id).await
            {
                tracing::error!(
                    import_id = self.import_id,
                    error = %e,
                    "Master book update failed",
                );
            }
        }

        self.report(&ImportStage::Finalizing, saved).await?;

        let summary = json!({
            "workbook": workbook.summary(),
            "file_type": self.file_type.as_str(),
            "validation": validation,
            "transactions": transaction_stats(&records),
            "estimator": estimator,
        });
        let report = ImportReport {
            saved,
            duplicates: duplicate_idx.len(),
            estimator_saved: estimator.as_ref().map_or(0, |o| o.processed),
            errors,
        };

        KdpImportRepo::complete(
            &self.pool,
            self.import_id,
            &ImportCompletion {
                processed_records: report.saved as i32,
                error_records: report.errors.len() as i32,
                duplicate_records: report.duplicates as i32,
                error_log: report.errors.clone(),
                summary,
                mapping_config: json!(mapping_config),
            },
        )
        .await?;

        Ok(report)
    }

    /// Filter the estimator sheets and store the surviving rows with their
    /// royalty converted to USD.
    async fn store_estimator_rows(&self, workbook: &Workbook) -> Result<EstimatorOutcome, sqlx::Error> {
        let outcome = process_estimator_workbook(workbook);
        let rates = current_rate_table(&self.pool).await?;

        let rows: Vec<_> = outcome
            .records
            .iter()
            .map(|rec| {
                let usd = match (rec.royalty, rec.currency.as_deref()) {
                    (Some(amount), Some(currency)) => rates.to_usd(amount, currency),
                    _ => None,
                };
                (rec.clone(), usd)
            })
            .collect();

        if !rows.is_empty() {
            EstimatorDataRepo::insert_batch(&self.pool, self.import_id, self.user_id, &rows).await?;
        }
        tracing::debug!(
            import_id = self.import_id,
            stored = outcome.processed,
            filtered = outcome.filtered,
            "Estimator rows stored",
        );
        Ok(outcome)
    }

    async fn report(&self, stage: &ImportStage, processed: usize) -> Result<(), sqlx::Error> {
        KdpImportRepo::update_progress(
            &self.pool,
            self.import_id,
            stage.progress(),
            &stage.label(),
            processed as i32,
        )
        .await
    }
}

/// Fail imports left `pending` or `processing` by a previous run of the
/// server. Call before accepting uploads.
pub async fn recover_interrupted(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let failed = KdpImportRepo::fail_interrupted(pool, INTERRUPTED_MESSAGE).await?;
    if failed > 0 {
        tracing::warn!(failed, "Interrupted imports marked as failed");
    }
    Ok(failed)
}
