//! Spreadsheet engine API.
//!
//! This module provides the core computation machinery:
//!
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`parse`] / [`ParsedFormula`] - Formula parsing and dependency extraction
//! - [`DependencyGraph`] - Reference edges, cycle rejection, affected-set discovery
//! - [`Evaluator`] - Formula evaluation against a cell-value resolver
//! - [`format_number`] - Numeric display formatting

mod cell_ref;
mod eval;
mod format;
mod graph;
mod parser;

pub use cell_ref::CellRef;
pub use eval::{CalcResult, Evaluator};
pub use format::format_number;
pub use graph::DependencyGraph;
pub use parser::{ParsedFormula, expand_range, extract_dependencies, parse, validate};
