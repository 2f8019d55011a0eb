//! Import lifecycle: status values and the progress steps reported while an
//! import is processed.

pub const IMPORT_PENDING: &str = "pending";
pub const IMPORT_PROCESSING: &str = "processing";
pub const IMPORT_COMPLETED: &str = "completed";
pub const IMPORT_FAILED: &str = "failed";

pub const VALID_IMPORT_STATUSES: &[&str] =
    &[IMPORT_PENDING, IMPORT_PROCESSING, IMPORT_COMPLETED, IMPORT_FAILED];

/// Highest progress reported while sheets are still being read.
pub const MAX_SHEET_PROGRESS: i32 = 70;

/// A processing step. Progress only moves forward through these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStage {
    Initializing,
    /// Reading a sheet; carries the sheet name and progress so far.
    ProcessingSheet { sheet: String, progress: i32 },
    CheckingDuplicates,
    Saving,
    UpdatingMasterBooks,
    Finalizing,
    Completed,
}

impl ImportStage {
    pub fn progress(&self) -> i32 {
        match self {
            Self::Initializing => 0,
            Self::ProcessingSheet { progress, .. } => *progress,
            Self::CheckingDuplicates => 75,
            Self::Saving => 85,
            Self::UpdatingMasterBooks => 90,
            Self::Finalizing => 95,
            Self::Completed => 100,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Initializing => "Initializing import process".to_string(),
            Self::ProcessingSheet { sheet, .. } => format!("Processing sheet: {sheet}"),
            Self::CheckingDuplicates => "Checking for duplicates".to_string(),
            Self::Saving => "Saving import data".to_string(),
            Self::UpdatingMasterBooks => "Updating master books".to_string(),
            Self::Finalizing => "Finalizing import".to_string(),
            Self::Completed => "Import completed successfully".to_string(),
        }
    }
}

/// Share of rows read so far, capped at [`MAX_SHEET_PROGRESS`].
pub fn progress_for_rows(processed: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    let pct = (processed as f64 / total as f64 * 100.0).round() as i32;
    pct.clamp(0, MAX_SHEET_PROGRESS)
}
