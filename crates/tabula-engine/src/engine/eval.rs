//! Formula evaluation.
//!
//! Two recognized shapes, tried in order:
//!
//! 1. Range aggregates - `SUM`, `AVERAGE`, `MIN`, `MAX`, `COUNT` over a
//!    two-endpoint range, computed directly against the resolver.
//! 2. Generic arithmetic - bare cell references are substituted with their
//!    resolved values and the remaining expression goes through a Rhai
//!    engine (`+ - * /`, parentheses, numeric literals).
//!
//! Evaluation is total: every failure folds into the result as one of the
//! cell-local error values `#VALUE!`, `#DIV/0!` or `#ERROR!`, and the
//! mutation pipeline never sees an exception.

use rhai::{Dynamic, Engine, EvalAltResult};

use super::cell_ref::CellRef;
use super::format::format_number;
use super::parser::{ParsedFormula, cell_token_re, expand_range, range_fn_re};

/// Outcome of evaluating one formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalcResult {
    /// Display value: a number's string form, or an error value.
    pub value: String,
    /// Error message when `value` is an error value.
    pub error: Option<String>,
}

impl CalcResult {
    fn ok(value: String) -> Self {
        CalcResult { value, error: None }
    }

    fn err(value: &str, message: impl Into<String>) -> Self {
        CalcResult {
            value: value.to_string(),
            error: Some(message.into()),
        }
    }
}

/// Evaluates parsed formulas against a cell-value resolver.
///
/// The resolver returns `None` for unresolvable cells (absent, empty, or
/// non-numeric); what that means depends on context - aggregates mostly
/// skip such cells, arithmetic substitutes zero.
pub struct Evaluator {
    engine: Engine,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator {
            engine: Engine::new(),
        }
    }

    pub fn calculate(
        &self,
        formula: &ParsedFormula,
        resolve: &dyn Fn(&CellRef) -> Option<f64>,
    ) -> CalcResult {
        if let Some(caps) = range_fn_re().captures(&formula.expr) {
            if let (Some(start), Some(end)) =
                (CellRef::from_str(&caps[2]), CellRef::from_str(&caps[3]))
            {
                let name = caps[1].to_ascii_uppercase();
                return classify(aggregate(&name, &start, &end, resolve));
            }
        }

        self.calculate_arithmetic(&formula.expr, resolve)
    }

    fn calculate_arithmetic(
        &self,
        expr: &str,
        resolve: &dyn Fn(&CellRef) -> Option<f64>,
    ) -> CalcResult {
        let substituted = cell_token_re().replace_all(expr, |caps: &regex::Captures| {
            let token = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            match CellRef::from_str(token) {
                Some(cell_ref) => match resolve(&cell_ref) {
                    Some(value) => format!("({:?})", value),
                    None => {
                        log::warn!("cell {} has no numeric value, substituting 0", cell_ref);
                        "(0.0)".to_string()
                    }
                },
                // Token too large to be a real address; leave it for Rhai
                // to report.
                None => token.to_string(),
            }
        });

        match self.engine.eval_expression::<Dynamic>(&substituted) {
            Ok(value) => classify(dynamic_to_number(value)),
            Err(e) => match *e {
                EvalAltResult::ErrorArithmetic(..) => {
                    CalcResult::err("#DIV/0!", "Division by zero")
                }
                other => CalcResult::err("#ERROR!", other.to_string()),
            },
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn dynamic_to_number(value: Dynamic) -> f64 {
    if let Ok(f) = value.as_float() {
        f
    } else if let Ok(i) = value.as_int() {
        i as f64
    } else {
        f64::NAN
    }
}

/// NaN and infinity never reach the cell as numbers; they become the
/// spreadsheet error values instead.
fn classify(n: f64) -> CalcResult {
    if n.is_nan() {
        CalcResult::err("#VALUE!", "Formula result is not a number")
    } else if !n.is_finite() {
        CalcResult::err("#DIV/0!", "Division by zero")
    } else {
        CalcResult::ok(format_number(n))
    }
}

fn aggregate(
    name: &str,
    start: &CellRef,
    end: &CellRef,
    resolve: &dyn Fn(&CellRef) -> Option<f64>,
) -> f64 {
    let resolved: Vec<Option<f64>> = expand_range(start, end).iter().map(resolve).collect();
    let numeric: Vec<f64> = resolved.iter().filter_map(|v| *v).collect();

    match name {
        // SUM counts unresolvable cells as zero; the others skip them.
        "SUM" => resolved.iter().map(|v| v.unwrap_or(0.0)).sum(),
        "AVERAGE" => numeric.iter().sum::<f64>() / numeric.len() as f64,
        "COUNT" => numeric.len() as f64,
        // MIN/MAX of an all-blank range is 0, not an error.
        "MIN" if numeric.is_empty() => 0.0,
        "MIN" => numeric.iter().copied().fold(f64::INFINITY, f64::min),
        "MAX" if numeric.is_empty() => 0.0,
        "MAX" => numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        _ => f64::NAN,
    }
}
