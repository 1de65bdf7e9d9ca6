//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell ids
//! (e.g. "A1", "B2", "AA100") and zero-indexed column/row coordinates.
//! The string form is the wire contract the rest of the system relies on:
//! uppercase column letters in bijective base-26 (A=1..Z=26, AA=27, ...)
//! followed by a 1-indexed row number. Lowercase input is rejected.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn cell_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z]+)([0-9]+)$").expect("cell id regex must compile"))
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell id such as "A1" or "AA100".
    /// Returns None for lowercase letters, malformed input, row 0, or overflow.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(id: &str) -> Option<CellRef> {
        Self::parse_a1(id)
    }

    fn parse_a1(id: &str) -> Option<CellRef> {
        let caps = cell_id_re().captures(id)?;
        let letters = &caps[1];
        let numbers = &caps[2];

        let mut col_acc = 0usize;
        for c in letters.bytes() {
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        let col = col_acc.checked_sub(1)?;

        let row = numbers.parse::<usize>().ok()?.checked_sub(1)?;

        Some(CellRef::new(col, row))
    }

    /// Convert a column index to letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::CellRef;

    #[test]
    fn test_round_trip_for_representative_ids() {
        for id in ["A1", "Z1", "AA1", "AZ100", "BA52", "ZZ702", "AAA1"] {
            let cell_ref = CellRef::from_str(id).unwrap();
            assert_eq!(cell_ref.to_string(), id);
        }
    }

    #[test]
    fn test_round_trip_from_coordinates() {
        for col in [0, 1, 25, 26, 51, 52, 701, 702, 18277] {
            for row in [0, 1, 99, 9999] {
                let cell_ref = CellRef::new(col, row);
                assert_eq!(CellRef::from_str(&cell_ref.to_string()), Some(cell_ref));
            }
        }
    }

    #[test]
    fn test_rejects_lowercase_and_malformed() {
        assert!(CellRef::from_str("a1").is_none());
        assert!(CellRef::from_str("Aa1").is_none());
        assert!(CellRef::from_str("A0").is_none());
        assert!(CellRef::from_str("A").is_none());
        assert!(CellRef::from_str("1A").is_none());
        assert!(CellRef::from_str("A1B").is_none());
        assert!(CellRef::from_str("").is_none());
    }

    #[test]
    fn test_parse_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::from_str(&huge).is_none());
    }
}
