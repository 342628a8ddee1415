use std::collections::BTreeMap;

use tallysheet_core::{CellId, MAX_ROWS};
use tallysheet_formula::shift_formula_rows;

use crate::config::ReferenceAdjustment;
use crate::sheet::Sheet;

impl Sheet {
    /// Insert an empty row at `at_row`, moving that row and everything below
    /// it down by one. Cells pushed past the last row are dropped.
    pub fn insert_row(&mut self, at_row: u32) {
        let moved = self.store.drain_where(|c| c.id.row >= at_row);
        let count = moved.len();
        for cell in moved {
            if cell.id.row + 1 >= MAX_ROWS {
                tracing::warn!("Dropped {} pushed past the last row", cell.id);
                continue;
            }
            self.store.insert(cell.moved_to(CellId::new(cell.id.row + 1, cell.id.col)));
        }
        self.row_heights = shift_keys(&self.row_heights, at_row, 1);

        tracing::debug!("Inserted row {}: moved {} cell(s)", at_row + 1, count);
        self.adjust_references(at_row, 1);
    }

    /// Remove row `at_row`, moving everything below it up by one
    pub fn delete_row(&mut self, at_row: u32) {
        let moved = self.store.drain_where(|c| c.id.row >= at_row);
        let mut dropped = 0;
        for cell in moved {
            if cell.id.row == at_row {
                dropped += 1;
                continue;
            }
            self.store.insert(cell.moved_to(CellId::new(cell.id.row - 1, cell.id.col)));
        }
        self.row_heights.remove(&at_row);
        self.row_heights = shift_keys(&self.row_heights, at_row + 1, -1);

        tracing::debug!("Deleted row {}: dropped {} cell(s)", at_row + 1, dropped);
        self.adjust_references(at_row, -1);
    }

    /// Bring formulas and edges in line with rows that just moved.
    ///
    /// Verbatim keeps formula text and cached values; the graph is rebuilt so
    /// edges match the stored text. Shift rewrites every formula to follow the
    /// cells it names, then recalculates.
    fn adjust_references(&mut self, at_row: u32, delta: i64) {
        match self.config.reference_adjustment {
            ReferenceAdjustment::Verbatim => self.rebuild_dependency_graph(),
            ReferenceAdjustment::Shift => {
                let rewritten: Vec<(CellId, String)> = self
                    .store
                    .iter()
                    .filter(|c| c.is_formula())
                    .filter_map(|c| Some((c.id, shift_formula_rows(&c.raw, at_row, delta)?)))
                    .collect();
                for (id, raw) in rewritten {
                    self.store.set_raw(id, &raw);
                }
                self.rebuild_dependency_graph();
                self.recalculate_all();
            }
        }
    }
}

/// Move every key at or past `from` by `delta`, dropping keys pushed off the grid
fn shift_keys(map: &BTreeMap<u32, f64>, from: u32, delta: i64) -> BTreeMap<u32, f64> {
    map.iter()
        .filter_map(|(&key, &value)| {
            if key < from {
                return Some((key, value));
            }
            let moved = key as i64 + delta;
            (0..MAX_ROWS as i64)
                .contains(&moved)
                .then_some((moved as u32, value))
        })
        .collect()
}
