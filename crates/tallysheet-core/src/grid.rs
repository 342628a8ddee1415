use serde::{Deserialize, Serialize};

use crate::cell_id::{CellId, CellRange, MAX_COLS, MAX_ROWS};

pub const INITIAL_ROWS: u32 = 50;
pub const INITIAL_COLS: u32 = 30;
pub const EXPANSION_BATCH_ROWS: u32 = 50;
pub const EXPANSION_BATCH_COLS: u32 = 30;
/// Empty rows/cols kept past the used range when trimming
pub const TRIM_BUFFER: u32 = 20;
/// Trim only applies when an axis would change by more than this
pub const TRIM_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Col,
}

/// Soft, virtual grid size. Constrains navigation and export, never storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub rows: u32,
    pub cols: u32,
    initial_rows: u32,
    initial_cols: u32,
}

impl Default for GridBounds {
    fn default() -> Self {
        GridBounds::new(INITIAL_ROWS, INITIAL_COLS)
    }
}

impl GridBounds {
    pub fn new(initial_rows: u32, initial_cols: u32) -> Self {
        let initial_rows = initial_rows.clamp(1, MAX_ROWS);
        let initial_cols = initial_cols.clamp(1, MAX_COLS);
        GridBounds {
            rows: initial_rows,
            cols: initial_cols,
            initial_rows,
            initial_cols,
        }
    }

    /// Grow one axis by a batch, capped at the hard limit.
    /// Returns false when the axis is already at its maximum.
    pub fn expand(&mut self, axis: Axis) -> bool {
        let (current, batch, max) = match axis {
            Axis::Row => (&mut self.rows, EXPANSION_BATCH_ROWS, MAX_ROWS),
            Axis::Col => (&mut self.cols, EXPANSION_BATCH_COLS, MAX_COLS),
        };
        if *current >= max {
            return false;
        }
        *current = current.saturating_add(batch).min(max);
        true
    }

    /// Shrink (or grow) to the used extent plus a buffer.
    ///
    /// The extent covers the used range and the active cell. Nothing changes
    /// unless at least one axis moves by more than [`TRIM_THRESHOLD`].
    pub fn trim(&mut self, used: Option<CellRange>, active: CellId) -> bool {
        let (mut max_row, mut max_col) = used.map(|r| (r.end.row, r.end.col)).unwrap_or((0, 0));
        max_row = max_row.max(active.row);
        max_col = max_col.max(active.col);

        let rows = (max_row + 1 + TRIM_BUFFER).clamp(self.initial_rows, MAX_ROWS);
        let cols = (max_col + 1 + TRIM_BUFFER).clamp(self.initial_cols, MAX_COLS);

        if self.rows.abs_diff(rows) > TRIM_THRESHOLD || self.cols.abs_diff(cols) > TRIM_THRESHOLD {
            self.rows = rows;
            self.cols = cols;
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: CellId) -> bool {
        id.row < self.rows && id.col < self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_in_batches() {
        let mut grid = GridBounds::default();
        assert!(grid.expand(Axis::Row));
        assert_eq!(grid.rows, 100);
        assert!(grid.expand(Axis::Col));
        assert_eq!(grid.cols, 60);
    }

    #[test]
    fn test_expand_caps_at_max() {
        let mut grid = GridBounds::new(MAX_ROWS - 10, MAX_COLS);
        assert!(grid.expand(Axis::Row));
        assert_eq!(grid.rows, MAX_ROWS);
        assert!(!grid.expand(Axis::Row));
        assert!(!grid.expand(Axis::Col));
    }

    #[test]
    fn test_trim_to_used_range_plus_buffer() {
        let mut grid = GridBounds::default();
        for _ in 0..4 {
            grid.expand(Axis::Row);
        }
        assert_eq!(grid.rows, 250);

        let used = CellRange::new(CellId::new(0, 0), CellId::new(99, 3));
        assert!(grid.trim(Some(used), CellId::new(0, 0)));
        assert_eq!(grid.rows, 120);
        // Never below the initial size
        assert_eq!(grid.cols, 30);
    }

    #[test]
    fn test_trim_ignores_small_changes() {
        let mut grid = GridBounds::default();
        // Extent 33 rows -> target 54, only 4 away from 50
        let used = CellRange::new(CellId::new(0, 0), CellId::new(33, 0));
        assert!(!grid.trim(Some(used), CellId::new(0, 0)));
        assert_eq!(grid.rows, 50);
    }

    #[test]
    fn test_trim_counts_active_cell() {
        let mut grid = GridBounds::default();
        grid.expand(Axis::Row);
        grid.expand(Axis::Row);
        assert!(grid.trim(None, CellId::new(120, 0)));
        assert_eq!(grid.rows, 141);
    }
}
