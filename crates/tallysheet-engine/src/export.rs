use tallysheet_core::CellId;

use crate::sheet::Sheet;

impl Sheet {
    /// Display values of the top-left `max_rows` x `max_cols` block, blank
    /// cells as empty strings
    pub fn export_rows(&self, max_rows: u32, max_cols: u32) -> Vec<Vec<String>> {
        (0..max_rows)
            .map(|row| {
                (0..max_cols)
                    .map(|col| self.store.value(CellId::new(row, col)).to_string())
                    .collect()
            })
            .collect()
    }
}

/// Join cells with commas and rows with newlines. Values are not quoted.
pub fn to_csv_lines(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| row.join(","))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn test_export_bounds() {
        let sheet = Sheet::demo(EngineConfig::default());
        let rows = sheet.export_rows(2, 5);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["Item", "Cost", "Qty", "Total", ""]);
        assert_eq!(rows[1], ["MacBook Pro", "2400", "2", "4800", ""]);
        assert!(sheet.export_rows(0, 5).is_empty());
    }

    #[test]
    fn test_csv_lines() {
        let sheet = Sheet::demo(EngineConfig::default());
        let csv = to_csv_lines(&sheet.export_rows(5, 4));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Item,Cost,Qty,Total");
        assert_eq!(lines[4], ",,Grand Total,7550");
        assert_eq!(to_csv_lines(&[]), "");
    }
}
