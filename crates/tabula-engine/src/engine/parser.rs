//! Formula parsing and dependency extraction.
//!
//! A formula is any cell input starting with `=`. Parsing never fails for
//! such input: a malformed formula still yields a [`ParsedFormula`] carrying
//! whatever dependencies are regex-extractable, and genuine failure surfaces
//! later during evaluation.
//!
//! Handles:
//! - Range aggregate calls: `SUM(A1:B5)`, `AVERAGE(A1:A9)`, ... (function
//!   name matched case-insensitively, cell ids uppercase only)
//! - Bare cell references anywhere in an arithmetic expression: `A1 + B2 * 2`

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::cell_ref::CellRef;

/// Ranges expanding to more than this many cells are ignored for
/// dependency purposes.
const MAX_RANGE_CELLS: usize = 1_000_000;

/// A parsed formula: the original text, the expression after `=`, and the
/// set of cells it reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedFormula {
    /// Full formula text including the leading `=`.
    pub raw: String,
    /// Expression text after the `=`.
    pub expr: String,
    /// Cells referenced by the expression, deduplicated.
    pub dependencies: Vec<CellRef>,
}

/// Regex that matches range aggregate calls like `SUM(A1:B5)`.
///
/// Captures:
/// - group 1: function name (case-insensitive)
/// - group 2: start cell id
/// - group 3: end cell id
pub(crate) fn range_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b((?i:SUM|AVERAGE|MIN|MAX|COUNT))\(([A-Z]+[0-9]+):([A-Z]+[0-9]+)\)")
            .expect("range aggregate regex must compile")
    })
}

fn range_fn_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?i:SUM|AVERAGE|MIN|MAX|COUNT)\(")
            .expect("range aggregate prefix regex must compile")
    })
}

pub(crate) fn cell_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]+[0-9]+\b").expect("cell token regex must compile"))
}

/// Parse a formula string. Returns None unless the input starts with `=`.
pub fn parse(input: &str) -> Option<ParsedFormula> {
    if !input.starts_with('=') {
        return None;
    }
    let raw = input.trim().to_string();
    let expr = raw[1..].trim().to_string();
    let dependencies = extract_dependencies(&expr);
    Some(ParsedFormula {
        raw,
        expr,
        dependencies,
    })
}

/// Extract the cells a formula reads.
///
/// If the expression contains a recognized range aggregate, the dependencies
/// are the expansion of that range. Otherwise every bare cell-reference
/// token counts, deduplicated.
pub fn extract_dependencies(expr: &str) -> Vec<CellRef> {
    let expr = expr.strip_prefix('=').unwrap_or(expr);

    if let Some(caps) = range_fn_re().captures(expr) {
        if let (Some(start), Some(end)) = (CellRef::from_str(&caps[2]), CellRef::from_str(&caps[3]))
        {
            return expand_range(&start, &end);
        }
    }

    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    for token in cell_token_re().find_iter(expr) {
        if let Some(cell_ref) = CellRef::from_str(token.as_str()) {
            if seen.insert(cell_ref.clone()) {
                deps.push(cell_ref);
            }
        }
    }
    deps
}

/// Expand two endpoints into the inclusive list of cells between them,
/// columns outer, rows inner. Endpoints may be given in any order.
pub fn expand_range(start: &CellRef, end: &CellRef) -> Vec<CellRef> {
    let min_row = start.row.min(end.row);
    let max_row = start.row.max(end.row);
    let min_col = start.col.min(end.col);
    let max_col = start.col.max(end.col);

    let row_count = max_row - min_row + 1;
    let col_count = max_col - min_col + 1;
    let Some(cell_count) = row_count.checked_mul(col_count) else {
        return Vec::new();
    };
    if cell_count > MAX_RANGE_CELLS {
        log::warn!(
            "range {}:{} expands to {} cells, over the {} cell limit; ignoring",
            start,
            end,
            cell_count,
            MAX_RANGE_CELLS
        );
        return Vec::new();
    }

    let mut cells = Vec::with_capacity(cell_count);
    for col in min_col..=max_col {
        for row in min_row..=max_row {
            cells.push(CellRef::new(col, row));
        }
    }
    cells
}

/// Advisory syntax check. A recognized range aggregate must fully match its
/// call pattern; anything else passes if it compiles as an expression.
/// Laxer than evaluation itself.
pub fn validate(input: &str) -> bool {
    let Some(expr) = input.strip_prefix('=') else {
        return false;
    };

    if range_fn_prefix_re().is_match(expr) {
        return range_fn_re().is_match(expr);
    }

    rhai::Engine::new_raw().compile_expression(expr).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(deps: &[CellRef]) -> Vec<String> {
        deps.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_parse_rejects_non_formula() {
        assert!(parse("42").is_none());
        assert!(parse("hello").is_none());
    }

    #[test]
    fn test_parse_extracts_bare_references_deduplicated() {
        let parsed = parse("=A1 + B2 + A1 * 2").unwrap();
        assert_eq!(ids(&parsed.dependencies), vec!["A1", "B2"]);
        assert_eq!(parsed.expr, "A1 + B2 + A1 * 2");
    }

    #[test]
    fn test_range_aggregate_dependencies_are_the_expansion() {
        let parsed = parse("=SUM(A1:A3)").unwrap();
        assert_eq!(ids(&parsed.dependencies), vec!["A1", "A2", "A3"]);
    }

    #[test]
    fn test_range_aggregate_name_is_case_insensitive() {
        let parsed = parse("=average(B1:B2)").unwrap();
        assert_eq!(ids(&parsed.dependencies), vec!["B1", "B2"]);
    }

    #[test]
    fn test_expand_range_is_column_major() {
        let start = CellRef::from_str("A1").unwrap();
        let end = CellRef::from_str("B2").unwrap();
        assert_eq!(ids(&expand_range(&start, &end)), vec!["A1", "A2", "B1", "B2"]);
    }

    #[test]
    fn test_expand_range_handles_reversed_endpoints() {
        let start = CellRef::from_str("B2").unwrap();
        let end = CellRef::from_str("A1").unwrap();
        assert_eq!(ids(&expand_range(&start, &end)), vec!["A1", "A2", "B1", "B2"]);
    }

    #[test]
    fn test_expand_range_multi_letter_columns() {
        let start = CellRef::from_str("AA1").unwrap();
        let end = CellRef::from_str("AB1").unwrap();
        assert_eq!(ids(&expand_range(&start, &end)), vec!["AA1", "AB1"]);
    }

    #[test]
    fn test_oversized_range_yields_no_dependencies() {
        let parsed = parse("=SUM(A1:Z1000000)").unwrap();
        assert!(parsed.dependencies.is_empty());
    }

    #[test]
    fn test_malformed_formula_still_parses() {
        let parsed = parse("=A1 + (").unwrap();
        assert_eq!(ids(&parsed.dependencies), vec!["A1"]);
    }

    #[test]
    fn test_validate_accepts_arithmetic_and_range_calls() {
        assert!(validate("=A1 + 2"));
        assert!(validate("=(A1 + B1) * 2"));
        assert!(validate("=SUM(A1:B5)"));
        assert!(validate("=sum(A1:B5)"));
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(!validate("no equals"));
        assert!(!validate("=A1 + ("));
        assert!(!validate("=SUM(A1)"));
        assert!(!validate("=SUM(A1:)"));
    }
}
