//! JSON export.
//!
//! A flat object keyed by cell id. Value exports carry just the display
//! string; formula exports carry the full cell record so a host can
//! reconstruct state.

use serde_json::{Map, Value, json};
use tabula_engine::engine::CellRef;

use crate::document::Sheet;
use crate::error::Result;

impl Sheet {
    pub(crate) fn export_json(&self, include_formulas: bool, targets: &[CellRef]) -> Result<String> {
        let mut sorted: Vec<&CellRef> = targets.iter().collect();
        sorted.sort();

        let mut map = Map::new();
        for cell_ref in sorted {
            if include_formulas {
                if let Some(cell) = self.cells().get(cell_ref) {
                    map.insert(cell_ref.to_string(), serde_json::to_value(cell)?);
                }
            } else {
                let value = self.export_field(cell_ref, false);
                if value.is_empty() {
                    continue;
                }
                map.insert(cell_ref.to_string(), json!({ "value": value }));
            }
        }
        Ok(serde_json::to_string_pretty(&Value::Object(map))?)
    }
}

#[cfg(test)]
mod tests {
    use crate::document::Sheet;
    use crate::storage::{ExportFormat, ExportOptions};
    use serde_json::Value;

    fn export(sheet: &Sheet, include_formulas: bool) -> Value {
        let text = sheet
            .export_plain_text(&ExportOptions {
                format: ExportFormat::Json,
                include_formulas,
                ..ExportOptions::default()
            })
            .unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_value_export_is_flat_display_map() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "5").unwrap();
        sheet.set_cell("B1", "=A1*2").unwrap();

        let parsed = export(&sheet, false);
        assert_eq!(parsed["A1"]["value"], "5");
        assert_eq!(parsed["B1"]["value"], "10");
        assert!(parsed["B1"].get("formula").is_none());
    }

    #[test]
    fn test_formula_export_carries_full_record() {
        let mut sheet = Sheet::new();
        sheet.set_cell("A1", "5").unwrap();
        sheet.set_cell("B1", "=A1*2").unwrap();

        let parsed = export(&sheet, true);
        assert_eq!(parsed["B1"]["value"], "=A1*2");
        assert_eq!(parsed["B1"]["formula"], "=A1*2");
        assert_eq!(parsed["B1"]["calculatedValue"], "10");
        assert!(parsed["A1"].get("formula").is_none());
    }

    #[test]
    fn test_empty_sheet_exports_empty_object() {
        let sheet = Sheet::new();
        let parsed = export(&sheet, false);
        assert_eq!(parsed, serde_json::json!({}));
    }
}
