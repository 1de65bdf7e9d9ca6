//! Numeric display formatting.

/// Format a finite number the way users expect to see it in a cell:
/// integral values without a trailing `.0` (`7`, `40`), everything else in
/// shortest round-trip form (`1.5`). Negative zero displays as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    n.to_string()
}
