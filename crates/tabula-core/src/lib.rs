//! tabula-core - UI-agnostic document model, history and plain-text storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{Cell, CellFormat, CellStore, HistoryManager, Selection, Sheet, Snapshot};
pub use error::{Result, SheetError};
pub use storage::{ExportFormat, ExportOptions, ImportOptions};

pub use tabula_engine::engine::CellRef;
