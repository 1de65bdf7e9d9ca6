//! tabula_engine - Spreadsheet computation engine.
//!
//! The pieces that make a spreadsheet a spreadsheet, UI- and storage-free:
//! A1-style cell references, formula parsing with dependency extraction,
//! the cell dependency graph with cycle rejection, and formula evaluation.

pub mod engine;

#[cfg(test)]
mod tests {
    use crate::engine::*;

    #[test]
    fn test_parse_and_render_single_letter_columns() {
        let a1 = CellRef::from_str("A1").unwrap();
        assert_eq!(a1.row, 0);
        assert_eq!(a1.col, 0);

        let z9 = CellRef::from_str("Z9").unwrap();
        assert_eq!(z9.col, 25);
        assert_eq!(z9.row, 8);
        assert_eq!(z9.to_string(), "Z9");
    }

    #[test]
    fn test_parse_and_render_multi_letter_columns() {
        let aa1 = CellRef::from_str("AA1").unwrap();
        assert_eq!(aa1.col, 26);

        let az100 = CellRef::from_str("AZ100").unwrap();
        assert_eq!(az100.col, 51);
        assert_eq!(az100.row, 99);
        assert_eq!(az100.to_string(), "AZ100");
    }

    #[test]
    fn test_formula_dependencies_feed_the_graph() {
        let parsed = parse("=A1 + B2 * 2").unwrap();
        let mut graph = DependencyGraph::new();
        let target = CellRef::from_str("C1").unwrap();
        for dep in &parsed.dependencies {
            assert!(graph.add_dependency(&target, dep));
        }
        assert_eq!(
            graph.evaluation_order(&CellRef::from_str("A1").unwrap()),
            vec![target]
        );
    }

    #[test]
    fn test_evaluator_end_to_end_sum_over_range() {
        let evaluator = Evaluator::new();
        let parsed = parse("=SUM(A1:A3)").unwrap();
        let resolve = |cell_ref: &CellRef| Some((cell_ref.row + 1) as f64);
        let result = evaluator.calculate(&parsed, &resolve);
        assert_eq!(result.value, "6");
        assert!(result.error.is_none());
    }
}
