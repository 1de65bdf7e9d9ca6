//! Cell contents and the in-memory cell store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabula_engine::engine::CellRef;

/// Horizontal alignment of a cell's display value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Closed set of number presentations. Presentation only - computation
/// never looks at this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    General,
    Number { decimals: u8 },
    Currency,
    Percent,
}

/// Formatting attributes, all optional so partial updates merge cleanly.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<NumberFormat>,
}

impl CellFormat {
    /// Overlay `other` onto self: set fields win, unset fields keep the
    /// current value.
    pub fn merge(&mut self, other: &CellFormat) {
        if other.bold.is_some() {
            self.bold = other.bold;
        }
        if other.italic.is_some() {
            self.italic = other.italic;
        }
        if other.underline.is_some() {
            self.underline = other.underline;
        }
        if other.align.is_some() {
            self.align = other.align;
        }
        if other.number_format.is_some() {
            self.number_format = other.number_format;
        }
    }
}

/// One cell's contents.
///
/// Invariants: `formula` is present iff `raw_value` starts with `=`, and
/// only formula cells ever carry `calculated_value`/`error`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Literal user input.
    #[serde(rename = "value")]
    pub raw_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Cached evaluation result, valid while no dirtying mutation is pending.
    #[serde(rename = "calculatedValue", skip_serializing_if = "Option::is_none")]
    pub calculated_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<CellFormat>,
}

impl Cell {
    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }
}

/// The cell id -> cell mapping. Synchronous, in-memory, no side effects;
/// cells materialize lazily on first write.
#[derive(Clone, Debug, Default)]
pub struct CellStore {
    cells: HashMap<CellRef, Cell>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell_ref: &CellRef) -> Option<&Cell> {
        self.cells.get(cell_ref)
    }

    pub fn get_mut(&mut self, cell_ref: &CellRef) -> Option<&mut Cell> {
        self.cells.get_mut(cell_ref)
    }

    /// Get the cell at a position, materializing an empty one if needed.
    pub fn entry(&mut self, cell_ref: &CellRef) -> &mut Cell {
        self.cells.entry(cell_ref.clone()).or_default()
    }

    pub fn set(&mut self, cell_ref: CellRef, cell: Cell) {
        self.cells.insert(cell_ref, cell);
    }

    /// Clear a cell's content. Formatting survives; a cell with no
    /// formatting is removed outright.
    pub fn delete(&mut self, cell_ref: &CellRef) {
        if let Some(cell) = self.cells.get_mut(cell_ref) {
            match cell.format.take() {
                Some(format) => {
                    *cell = Cell {
                        format: Some(format),
                        ..Cell::default()
                    };
                }
                None => {
                    self.cells.remove(cell_ref);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &Cell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
