//! Plain-text import/export (CSV and JSON).
//!
//! The core never touches the filesystem; these operate on strings and
//! leave file I/O to the host.

mod csv;
mod json;

use tabula_engine::engine::CellRef;

use crate::document::Sheet;
use crate::error::Result;

/// Options for [`Sheet::import_plain_text`].
#[derive(Clone, Debug)]
pub struct ImportOptions {
    /// Drop all existing cells before importing.
    pub clear_existing: bool,
    /// Top-left target cell id for the imported block.
    pub start_cell: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            clear_existing: false,
            start_cell: "A1".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Options for [`Sheet::export_plain_text`].
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Emit formula text (or the full cell record for JSON) instead of
    /// display values.
    pub include_formulas: bool,
    /// Restrict the export to the current selection rectangle.
    pub only_selection: bool,
    pub format: ExportFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            include_formulas: false,
            only_selection: false,
            format: ExportFormat::Csv,
        }
    }
}

impl Sheet {
    pub fn export_plain_text(&self, opts: &ExportOptions) -> Result<String> {
        let targets = self.export_targets(opts.only_selection);
        match opts.format {
            ExportFormat::Csv => Ok(self.export_csv(opts.include_formulas, &targets)),
            ExportFormat::Json => self.export_json(opts.include_formulas, &targets),
        }
    }

    /// The cells an export covers: the selection rectangle when asked for
    /// (and one exists), otherwise every populated cell.
    fn export_targets(&self, only_selection: bool) -> Vec<CellRef> {
        if only_selection {
            if let Some(selection) = self.selection() {
                return tabula_engine::engine::expand_range(&selection.start, &selection.end);
            }
        }
        self.cells().iter().map(|(cell_ref, _)| cell_ref.clone()).collect()
    }
}
