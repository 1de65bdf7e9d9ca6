//! Document state and logic (UI-agnostic).

mod cell;
mod history;
mod ops;
mod state;

pub use cell::{Align, Cell, CellFormat, CellStore, NumberFormat};
pub use history::{HistoryManager, Selection, Snapshot};
pub use state::Sheet;
