//! CSV parsing and serialization.
//!
//! Quoting follows RFC 4180: fields containing commas, quotes or line
//! breaks are wrapped in double quotes, embedded quotes are doubled, and
//! quoted fields may span lines. Both `\n` and `\r\n` record separators
//! are accepted on input; output always uses `\n`.

use tabula_engine::engine::CellRef;

use super::ImportOptions;
use crate::document::Sheet;
use crate::error::{Result, SheetError};

/// Split CSV text into records of fields, honoring quoting.
///
/// Tolerant by construction: an unterminated quote consumes the rest of
/// the input as one field rather than failing.
pub(crate) fn parse_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

/// Quote a field when its content would break the record structure.
pub(crate) fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn bounding_rect(targets: &[CellRef]) -> Option<(CellRef, CellRef)> {
    let first = targets.first()?;
    let mut min = first.clone();
    let mut max = first.clone();
    for cell_ref in targets {
        min.row = min.row.min(cell_ref.row);
        min.col = min.col.min(cell_ref.col);
        max.row = max.row.max(cell_ref.row);
        max.col = max.col.max(cell_ref.col);
    }
    Some((min, max))
}

impl Sheet {
    /// Load CSV text into the sheet, one field per cell starting at the
    /// configured origin. Every field, empty ones included, replays through
    /// the normal edit path so formulas in the data wire up like hand-typed
    /// ones and blank fields overwrite whatever the target held. The whole
    /// import lands as a single history entry.
    pub fn import_plain_text(&mut self, text: &str, opts: &ImportOptions) -> Result<()> {
        let origin = CellRef::from_str(&opts.start_cell)
            .ok_or_else(|| SheetError::InvalidCellRef(opts.start_cell.clone()))?;
        let records = parse_csv_records(text);

        let before = self.snapshot();
        self.replaying = true;
        let outcome = self.apply_import(&origin, &records, opts.clear_existing);
        self.replaying = false;
        outcome?;

        // Streaming order may evaluate a formula before its inputs exist.
        self.recalculate_all();
        self.record_history(before);
        Ok(())
    }

    fn apply_import(
        &mut self,
        origin: &CellRef,
        records: &[Vec<String>],
        clear_existing: bool,
    ) -> Result<()> {
        if clear_existing {
            self.graph.clear();
            self.cells.clear();
        }
        for (row_offset, record) in records.iter().enumerate() {
            for (col_offset, field) in record.iter().enumerate() {
                let target = CellRef {
                    row: origin.row + row_offset,
                    col: origin.col + col_offset,
                };
                self.set_cell(&target.to_string(), field)?;
            }
        }
        Ok(())
    }

    /// Serialize the bounding rectangle of `targets`, row-major, one
    /// record per row with a trailing newline.
    pub(crate) fn export_csv(&self, include_formulas: bool, targets: &[CellRef]) -> String {
        let Some((min, max)) = bounding_rect(targets) else {
            return String::new();
        };
        let mut out = String::new();
        for row in min.row..=max.row {
            let mut fields = Vec::with_capacity(max.col - min.col + 1);
            for col in min.col..=max.col {
                let cell_ref = CellRef { row, col };
                fields.push(escape_csv_field(&self.export_field(&cell_ref, include_formulas)));
            }
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }

    /// One exported field: formula text when asked for and present,
    /// otherwise the display value. Empty cells export as empty fields.
    pub(crate) fn export_field(&self, cell_ref: &CellRef, include_formulas: bool) -> String {
        match self.cells().get(cell_ref) {
            Some(cell) if include_formulas && cell.is_formula() => cell.raw_value.clone(),
            Some(_) => self.display_value(cell_ref),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ExportFormat, ExportOptions};

    #[test]
    fn test_parse_simple_records() {
        let records = parse_csv_records("a,b,c\n1,2,3\n");
        assert_eq!(records, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_parse_quoted_comma_and_doubled_quote() {
        let records = parse_csv_records("\"a,b\",\"say \"\"hi\"\"\"\n");
        assert_eq!(records, vec![vec!["a,b", "say \"hi\""]]);
    }

    #[test]
    fn test_parse_quoted_embedded_newline() {
        let records = parse_csv_records("\"line1\nline2\",x\n");
        assert_eq!(records, vec![vec!["line1\nline2", "x"]]);
    }

    #[test]
    fn test_parse_crlf_and_missing_final_newline() {
        let records = parse_csv_records("a,b\r\nc,d");
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_escape_only_when_needed() {
        assert_eq!(escape_csv_field("plain"), "plain");
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_export_values_bounding_rectangle() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "1").unwrap();
        sheet.set_cell("B2", "=A1+1").unwrap();

        let csv = sheet.export_plain_text(&ExportOptions::default()).unwrap();
        assert_eq!(csv, "1,\n,2\n");
    }

    #[test]
    fn test_export_formulas_keeps_formula_text() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "2").unwrap();
        sheet.set_cell("B1", "=A1*3").unwrap();

        let csv = sheet
            .export_plain_text(&ExportOptions {
                include_formulas: true,
                ..ExportOptions::default()
            })
            .unwrap();
        assert_eq!(csv, "2,=A1*3\n");
    }

    #[test]
    fn test_import_evaluates_formulas_out_of_order() {
        // The formula arrives before the cells it reads.
        let mut sheet = Sheet::new();
        sheet
            .import_plain_text("=SUM(A2:A3)\n4\n6\n", &ImportOptions::default())
            .unwrap();
        assert_eq!(sheet.get_display_value("A1"), "10");
    }

    #[test]
    fn test_import_is_one_history_entry() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "old").unwrap();
        sheet
            .import_plain_text("1,2\n3,4\n", &ImportOptions {
                clear_existing: true,
                ..ImportOptions::default()
            })
            .unwrap();
        assert_eq!(sheet.get_display_value("B2"), "4");
        assert_eq!(sheet.get_display_value("A1"), "1");

        sheet.undo().unwrap();
        assert_eq!(sheet.get_display_value("A1"), "old");
        assert_eq!(sheet.get_display_value("B2"), "");
    }

    #[test]
    fn test_import_at_offset_origin() {
        let mut sheet = Sheet::new();
        sheet
            .import_plain_text("1,2\n", &ImportOptions {
                start_cell: "C5".to_string(),
                ..ImportOptions::default()
            })
            .unwrap();
        assert_eq!(sheet.get_display_value("C5"), "1");
        assert_eq!(sheet.get_display_value("D5"), "2");
        assert_eq!(sheet.get_display_value("A1"), "");
    }

    #[test]
    fn test_import_blank_field_clears_existing_cell() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "old-a").unwrap();
        sheet.set_cell("B1", "old-b").unwrap();
        sheet
            .import_plain_text(",new\n", &ImportOptions::default())
            .unwrap();
        assert_eq!(sheet.get_display_value("A1"), "");
        assert_eq!(sheet.get_display_value("B1"), "new");
    }

    #[test]
    fn test_round_trip_values_with_quoting() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "hello, world").unwrap();
        sheet.set_cell("B1", "say \"hi\"").unwrap();
        sheet.set_cell("A2", "42").unwrap();

        let csv = sheet.export_plain_text(&ExportOptions::default()).unwrap();

        let mut reloaded = Sheet::new();
        reloaded
            .import_plain_text(&csv, &ImportOptions::default())
            .unwrap();
        assert_eq!(reloaded.get_display_value("A1"), "hello, world");
        assert_eq!(reloaded.get_display_value("B1"), "say \"hi\"");
        assert_eq!(reloaded.get_display_value("A2"), "42");
    }

    #[test]
    fn test_selection_export_restricts_rectangle() {
        use crate::document::Selection;

        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "1").unwrap();
        sheet.set_cell("B1", "2").unwrap();
        sheet.set_cell("C1", "3").unwrap();
        sheet.set_selection(Some(Selection {
            start: CellRef::from_str("A1").unwrap(),
            end: CellRef::from_str("B1").unwrap(),
        }));

        let csv = sheet
            .export_plain_text(&ExportOptions {
                only_selection: true,
                format: ExportFormat::Csv,
                ..ExportOptions::default()
            })
            .unwrap();
        assert_eq!(csv, "1,2\n");
    }

    #[test]
    fn test_invalid_start_cell_is_an_error() {
        let mut sheet = Sheet::new();
        let result = sheet.import_plain_text("1\n", &ImportOptions {
            start_cell: "1A".to_string(),
            ..ImportOptions::default()
        });
        assert!(matches!(result, Err(SheetError::InvalidCellRef(_))));
    }
}
