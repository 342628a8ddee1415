use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use tallysheet_core::{parse_float_prefix, CellData, CellId};
use tallysheet_formula::shift_formula_offset;

use crate::config::ReferenceAdjustment;
use crate::sheet::Sheet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// What a row is ordered by: its pivot cell's display value
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
    Blank,
}

impl SortKey {
    fn of(value: &str) -> Self {
        if value.is_empty() {
            SortKey::Blank
        } else if let Some(n) = parse_float_prefix(value) {
            SortKey::Number(n)
        } else {
            SortKey::Text(value.to_string())
        }
    }

    /// Blanks go last whichever the direction; only the rest is reversed
    fn compare(&self, other: &Self, direction: SortDirection) -> Ordering {
        let ordering = match (self, other) {
            (SortKey::Blank, SortKey::Blank) => return Ordering::Equal,
            (SortKey::Blank, _) => return Ordering::Greater,
            (_, SortKey::Blank) => return Ordering::Less,
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        };
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl Sheet {
    /// Sort a block of rows by the values in `pivot_col`.
    ///
    /// The block is the selection's rows when the selection covers more than
    /// one row, otherwise every row of the used range. Rows move as units,
    /// styles included; equal keys keep their order.
    pub fn sort(&mut self, pivot_col: u32, direction: SortDirection) {
        let Some((start, end)) = self.sort_block() else {
            return;
        };

        let mut rows: BTreeMap<u32, Vec<CellData>> = (start..=end).map(|r| (r, Vec::new())).collect();
        for cell in self.store.drain_where(|c| (start..=end).contains(&c.id.row)) {
            rows.entry(cell.id.row).or_default().push(cell);
        }

        let mut keyed: Vec<(SortKey, u32, Vec<CellData>)> = rows
            .into_iter()
            .map(|(row, cells)| {
                let pivot = cells
                    .iter()
                    .find(|c| c.id.col == pivot_col)
                    .map(|c| c.value.as_str())
                    .unwrap_or("");
                (SortKey::of(pivot), row, cells)
            })
            .collect();
        // Vec::sort_by is stable
        keyed.sort_by(|a, b| a.0.compare(&b.0, direction));

        let shift = self.config.reference_adjustment == ReferenceAdjustment::Shift;
        for (target, (_, from, cells)) in (start..).zip(keyed) {
            let d_row = target as i64 - from as i64;
            for cell in cells {
                let mut moved = cell.moved_to(CellId::new(target, cell.id.col));
                if shift && d_row != 0 && moved.is_formula() {
                    if let Some(raw) = shift_formula_offset(&moved.raw, d_row, 0) {
                        moved.raw = raw;
                    }
                }
                self.store.insert(moved);
            }
        }

        tracing::debug!(
            "Sorted rows {}..={} by column {} ({:?})",
            start + 1,
            end + 1,
            pivot_col,
            direction
        );

        self.rebuild_dependency_graph();
        if shift {
            self.recalculate_all();
        }
    }

    fn sort_block(&self) -> Option<(u32, u32)> {
        if self.selection.len() > 1 {
            let start = self.selection.iter().map(|id| id.row).min()?;
            let end = self.selection.iter().map(|id| id.row).max()?;
            if start < end {
                return Some((start, end));
            }
        }
        let used = self.store.used_range()?;
        Some((used.start.row, used.end.row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tallysheet_core::StyleAttr;

    fn id(s: &str) -> CellId {
        s.parse().unwrap()
    }

    fn column(sheet: &Sheet, col: &str, rows: std::ops::RangeInclusive<u32>) -> Vec<String> {
        rows.map(|r| sheet.store().value(id(&format!("{col}{r}"))).to_string())
            .collect()
    }

    fn sheet_with(cells: &[(&str, &str)]) -> Sheet {
        let mut sheet = Sheet::new("Sheet 1");
        for (a1, raw) in cells {
            sheet.set_cell_raw(id(a1), raw);
        }
        sheet
    }

    #[test]
    fn test_numbers_before_text_blanks_last() {
        let mut sheet = sheet_with(&[
            ("A1", "pear"),
            ("A2", "10"),
            ("A4", "apple"),
            ("A5", "2"),
            ("B3", "no pivot"),
        ]);
        sheet.sort(0, SortDirection::Ascending);
        assert_eq!(column(&sheet, "A", 1..=5), ["2", "10", "apple", "pear", ""]);
        assert_eq!(sheet.store().value(id("B5")), "no pivot");

        sheet.sort(0, SortDirection::Descending);
        assert_eq!(column(&sheet, "A", 1..=5), ["pear", "apple", "10", "2", ""]);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let mut sheet = sheet_with(&[
            ("A1", "2"),
            ("B1", "first"),
            ("A2", "1"),
            ("B2", "x"),
            ("A3", "2"),
            ("B3", "second"),
        ]);
        sheet.sort(0, SortDirection::Ascending);
        assert_eq!(column(&sheet, "B", 1..=3), ["x", "first", "second"]);

        sheet.sort(0, SortDirection::Descending);
        assert_eq!(column(&sheet, "B", 1..=3), ["first", "second", "x"]);
    }

    #[test]
    fn test_rows_move_with_styles() {
        let mut sheet = sheet_with(&[("A1", "b"), ("A2", "a")]);
        sheet.set_cell_style(&[id("C1")], StyleAttr::Underline(true));
        sheet.sort(0, SortDirection::Ascending);
        assert!(sheet.get_cell(id("C2")).unwrap().style.underline);
        assert!(sheet.get_cell(id("C1")).is_none());
    }

    #[test]
    fn test_selection_limits_block() {
        let mut sheet = sheet_with(&[("A1", "Header"), ("A2", "3"), ("A3", "1"), ("A4", "2")]);
        sheet.select_range(id("A2"), id("A4"));
        sheet.sort(0, SortDirection::Ascending);
        assert_eq!(column(&sheet, "A", 1..=4), ["Header", "1", "2", "3"]);
    }

    #[test]
    fn test_single_row_selection_sorts_used_range() {
        let mut sheet = sheet_with(&[("A1", "3"), ("B1", "x"), ("A2", "1")]);
        sheet.select_range(id("A1"), id("B1"));
        sheet.sort(0, SortDirection::Ascending);
        assert_eq!(column(&sheet, "A", 1..=2), ["1", "3"]);
    }

    #[test]
    fn test_sort_rebuilds_edges() {
        let mut sheet = sheet_with(&[("A1", "9"), ("B1", "=C1"), ("A2", "1")]);
        sheet.sort(0, SortDirection::Ascending);
        assert_eq!(sheet.store().raw(id("B2")), "=C1");
        assert_eq!(sheet.graph().dependents(id("C1")), &[id("B2")]);
    }

    #[test]
    fn test_shift_mode_rewrites_moved_formulas() {
        let config = EngineConfig {
            reference_adjustment: ReferenceAdjustment::Shift,
            ..EngineConfig::default()
        };
        let mut sheet = Sheet::with_config("Sheet 1", config);
        for (a1, raw) in [("A1", "9"), ("B1", "=A1*2"), ("A2", "1"), ("B2", "=A2*2")] {
            sheet.set_cell_raw(id(a1), raw);
        }
        sheet.sort(0, SortDirection::Ascending);
        assert_eq!(sheet.store().raw(id("B1")), "=A1*2");
        assert_eq!(sheet.store().value(id("B1")), "2");
        assert_eq!(sheet.store().raw(id("B2")), "=A2*2");
        assert_eq!(sheet.store().value(id("B2")), "18");
    }

    #[test]
    fn test_empty_sheet_is_noop() {
        let mut sheet = Sheet::new("Sheet 1");
        sheet.sort(0, SortDirection::Descending);
        assert!(sheet.store().is_empty());
    }
}
