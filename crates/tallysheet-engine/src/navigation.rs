use serde::{Deserialize, Serialize};

use tallysheet_core::GridBounds;

use crate::sheet::Sheet;

/// Arrow-key movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// (d_row, d_col)
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

impl Sheet {
    /// Move the cursor one cell, or with `extend` move the selection's far
    /// corner. Returns false at the edge of the grid.
    pub fn navigate(&mut self, direction: Direction, extend: bool, grid: &GridBounds) -> bool {
        let from = if extend { self.focus } else { self.active };
        let (d_row, d_col) = direction.delta();
        match from.neighbor(d_row, d_col, grid.rows, grid.cols) {
            Some(next) => {
                self.select(next, extend);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallysheet_core::CellId;

    fn id(s: &str) -> CellId {
        s.parse().unwrap()
    }

    #[test]
    fn test_navigate_moves_cursor() {
        let mut sheet = Sheet::new("Sheet 1");
        let grid = GridBounds::default();
        assert!(sheet.navigate(Direction::Down, false, &grid));
        assert!(sheet.navigate(Direction::Right, false, &grid));
        assert_eq!(sheet.active(), id("B2"));
        assert_eq!(sheet.selection(), &[id("B2")]);
    }

    #[test]
    fn test_navigate_stops_at_edges() {
        let mut sheet = Sheet::new("Sheet 1");
        let grid = GridBounds::new(3, 3);
        assert!(!sheet.navigate(Direction::Up, false, &grid));
        assert!(!sheet.navigate(Direction::Left, false, &grid));

        sheet.select(id("C3"), false);
        assert!(!sheet.navigate(Direction::Down, false, &grid));
        assert!(!sheet.navigate(Direction::Right, false, &grid));
        assert_eq!(sheet.active(), id("C3"));
    }

    #[test]
    fn test_extend_grows_from_far_corner() {
        let mut sheet = Sheet::new("Sheet 1");
        let grid = GridBounds::default();
        sheet.select(id("B2"), false);
        sheet.navigate(Direction::Down, true, &grid);
        sheet.navigate(Direction::Down, true, &grid);
        sheet.navigate(Direction::Right, true, &grid);

        assert_eq!(sheet.active(), id("B2"));
        assert_eq!(sheet.selection().len(), 6);
        assert!(sheet.selection().contains(&id("C4")));

        // A plain move starts again from the active cell
        sheet.navigate(Direction::Up, false, &grid);
        assert_eq!(sheet.active(), id("B1"));
        assert_eq!(sheet.selection(), &[id("B1")]);
    }
}
