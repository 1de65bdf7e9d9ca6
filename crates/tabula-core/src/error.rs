//! Error types for Tabula core.

use thiserror::Error;

/// Errors that can escape the document model. Formula failures are not
/// among them - those are cell-local display values, never exceptions.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Invalid cell reference: {0}")]
    InvalidCellRef(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
