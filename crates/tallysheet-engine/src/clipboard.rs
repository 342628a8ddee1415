use serde::{Deserialize, Serialize};

use tallysheet_core::{CellData, CellId};
use tallysheet_formula::shift_formula_offset;

use crate::config::ReferenceAdjustment;
use crate::sheet::Sheet;

/// Owned copies of the populated cells of a selection.
///
/// `anchor` is the top-left corner of the whole selection, populated or not;
/// pasting places each cell at the same offset from the paste target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardSnapshot {
    pub anchor: CellId,
    pub cells: Vec<CellData>,
}

impl ClipboardSnapshot {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Sheet {
    /// Snapshot the populated cells among `ids`; `None` for an empty list
    pub fn snapshot(&self, ids: &[CellId]) -> Option<ClipboardSnapshot> {
        let min_row = ids.iter().map(|id| id.row).min()?;
        let min_col = ids.iter().map(|id| id.col).min()?;

        Some(ClipboardSnapshot {
            anchor: CellId::new(min_row, min_col),
            cells: ids.iter().filter_map(|id| self.store.get(*id)).cloned().collect(),
        })
    }

    /// Snapshot the current selection
    pub fn copy(&self) -> Option<ClipboardSnapshot> {
        self.snapshot(&self.selection)
    }

    /// Snapshot the current selection, then remove its cells entirely
    pub fn cut(&mut self) -> Option<ClipboardSnapshot> {
        let snapshot = self.copy()?;

        let removed: Vec<CellId> = snapshot.cells.iter().map(|c| c.id).collect();
        for cell in &snapshot.cells {
            self.graph.unlink_formula(cell.id, &cell.raw);
            self.store.remove(cell.id);
        }
        self.propagate(&removed);

        Some(snapshot)
    }

    /// Write a snapshot with its anchor at the active cell.
    ///
    /// Raw text, value and style are copied as they are; formulas are rewritten
    /// only under [`ReferenceAdjustment::Shift`]. Targets past the hard grid
    /// limits are skipped. Returns the ids written.
    pub fn paste(&mut self, snapshot: &ClipboardSnapshot) -> Vec<CellId> {
        let target = self.active;
        let mut written = Vec::with_capacity(snapshot.cells.len());

        for cell in &snapshot.cells {
            let d_row = cell.id.row as i64 - snapshot.anchor.row as i64;
            let d_col = cell.id.col as i64 - snapshot.anchor.col as i64;
            let Some(id) = target.offset(d_row, d_col) else {
                tracing::warn!("Paste target for {} is off the grid, skipped", cell.id);
                continue;
            };

            let raw = match self.config.reference_adjustment {
                ReferenceAdjustment::Shift if cell.is_formula() => shift_formula_offset(
                    &cell.raw,
                    id.row as i64 - cell.id.row as i64,
                    id.col as i64 - cell.id.col as i64,
                )
                .unwrap_or_else(|| cell.raw.clone()),
                _ => cell.raw.clone(),
            };

            self.graph.unlink_formula(id, self.store.raw(id));
            self.graph.link_formula(id, &raw);
            self.store.insert(CellData {
                id,
                raw,
                ..cell.clone()
            });
            written.push(id);
        }

        self.propagate(&written);
        written
    }
}
