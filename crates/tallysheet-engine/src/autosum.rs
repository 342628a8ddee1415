use tallysheet_core::{parse_float_prefix, CellId};

use crate::sheet::Sheet;

impl Sheet {
    /// Write `=SUM(..)` over the run of numeric cells above `target`.
    ///
    /// Blank cells directly above the target are stepped over first; the run
    /// then extends upward while cells hold a numeric value (`0` included).
    /// Returns false, leaving the sheet untouched, when no numeric cell is found.
    pub fn auto_sum(&mut self, target: CellId) -> bool {
        let col = target.col;
        let blank = |sheet: &Sheet, row: u32| sheet.store.value(CellId::new(row, col)).is_empty();
        let numeric = |sheet: &Sheet, row: u32| {
            sheet
                .store
                .get(CellId::new(row, col))
                .is_some_and(|c| parse_float_prefix(&c.value).is_some())
        };

        let mut end = target.row;
        while end > 0 && blank(self, end - 1) {
            end -= 1;
        }
        let mut start = end;
        while start > 0 && numeric(self, start - 1) {
            start -= 1;
        }
        if start == end {
            return false;
        }

        let formula = format!(
            "=SUM({}:{})",
            CellId::new(start, col),
            CellId::new(end - 1, col)
        );
        tracing::debug!("Auto-sum into {}: {}", target, formula);
        self.set_cell_raw(target, &formula);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CellId {
        s.parse().unwrap()
    }

    fn sheet_with(cells: &[(&str, &str)]) -> Sheet {
        let mut sheet = Sheet::new("Sheet 1");
        for (a1, raw) in cells {
            sheet.set_cell_raw(id(a1), raw);
        }
        sheet
    }

    #[test]
    fn test_sums_contiguous_run() {
        let mut sheet = sheet_with(&[("B1", "Cost"), ("B2", "10"), ("B3", "0"), ("B4", "5.5")]);
        assert!(sheet.auto_sum(id("B5")));
        assert_eq!(sheet.store().raw(id("B5")), "=SUM(B2:B4)");
        assert_eq!(sheet.store().value(id("B5")), "15.5");
    }

    #[test]
    fn test_steps_over_blank_gap() {
        let mut sheet = sheet_with(&[("C2", "5"), ("C3", "3"), ("C4", "")]);
        assert!(sheet.auto_sum(id("C5")));
        assert_eq!(sheet.store().raw(id("C5")), "=SUM(C2:C3)");
        assert_eq!(sheet.store().value(id("C5")), "8");
    }

    #[test]
    fn test_run_reaches_first_row() {
        let mut sheet = sheet_with(&[("A1", "1"), ("A2", "2")]);
        assert!(sheet.auto_sum(id("A3")));
        assert_eq!(sheet.store().raw(id("A3")), "=SUM(A1:A2)");
    }

    #[test]
    fn test_formula_results_count_as_numbers() {
        let mut sheet = sheet_with(&[("A1", "4"), ("A2", "=A1*2"), ("A3", "text"), ("A4", "1")]);
        assert!(sheet.auto_sum(id("A5")));
        assert_eq!(sheet.store().raw(id("A5")), "=SUM(A4:A4)");

        assert!(!sheet.auto_sum(id("B3")));
        assert!(sheet.auto_sum(id("A3")));
        assert_eq!(sheet.store().raw(id("A3")), "=SUM(A1:A2)");
    }

    #[test]
    fn test_nothing_to_sum() {
        let mut sheet = sheet_with(&[("A1", "label")]);
        assert!(!sheet.auto_sum(id("A2")));
        assert!(!sheet.auto_sum(id("A1")));
        assert!(sheet.get_cell(id("A2")).is_none());
    }
}
