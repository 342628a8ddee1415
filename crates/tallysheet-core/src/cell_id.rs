use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoordinateError;

/// Maximum number of rows (Excel compatibility)
pub const MAX_ROWS: u32 = 1_048_576;
/// Maximum number of columns (Column XFD)
pub const MAX_COLS: u32 = 16_384;

/// Cell identifier: a zero-based (row, col) pair rendered in A1 notation.
///
/// Ordering is row-major, so ordered collections of ids iterate the way a
/// sheet is read.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellId {
    pub row: u32,
    pub col: u32,
}

impl CellId {
    pub const fn new(row: u32, col: u32) -> Self {
        CellId { row, col }
    }

    /// Create an id, rejecting coordinates outside the hard grid limits
    pub fn checked(row: u32, col: u32) -> Result<Self, CoordinateError> {
        if row >= MAX_ROWS || col >= MAX_COLS {
            return Err(CoordinateError::OutOfBounds { row, col });
        }
        Ok(CellId { row, col })
    }

    /// Parse A1 notation (e.g., "A1" -> (0, 0), "b2" -> (1, 1))
    pub fn from_a1(notation: &str) -> Result<Self, CoordinateError> {
        let (row, col) = decode(notation)?;
        Ok(CellId { row, col })
    }

    /// Convert to A1 notation (e.g., (0, 0) -> "A1")
    pub fn to_a1(&self) -> String {
        encode(self.row, self.col)
    }

    /// Offset this id by (d_row, d_col).
    ///
    /// Returns `None` when the result would be negative or would reach the
    /// supplied (soft) grid bound; the caller decides whether to grow the grid.
    pub fn neighbor(&self, d_row: i64, d_col: i64, max_rows: u32, max_cols: u32) -> Option<CellId> {
        let row = self.row as i64 + d_row;
        let col = self.col as i64 + d_col;
        if row < 0 || col < 0 || row >= max_rows as i64 || col >= max_cols as i64 {
            return None;
        }
        Some(CellId::new(row as u32, col as u32))
    }

    /// Same cell moved by a signed offset, if the result stays inside the hard limits
    pub fn offset(&self, d_row: i64, d_col: i64) -> Option<CellId> {
        self.neighbor(d_row, d_col, MAX_ROWS, MAX_COLS)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_label(self.col), self.row + 1)
    }
}

impl FromStr for CellId {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellId::from_a1(s)
    }
}

impl TryFrom<String> for CellId {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CellId::from_a1(&value)
    }
}

impl From<CellId> for String {
    fn from(id: CellId) -> Self {
        id.to_a1()
    }
}

/// Encode a zero-based (row, col) pair as A1 notation
pub fn encode(row: u32, col: u32) -> String {
    format!("{}{}", col_to_label(col), row as u64 + 1)
}

/// Decode A1 notation into a zero-based (row, col) pair
pub fn decode(notation: &str) -> Result<(u32, u32), CoordinateError> {
    let notation = notation.trim().to_ascii_uppercase();
    let malformed = || CoordinateError::Malformed(notation.clone());

    let split = notation
        .find(|c: char| !c.is_ascii_uppercase())
        .ok_or_else(malformed)?;
    let (col_str, row_str) = notation.split_at(split);

    if col_str.is_empty() || row_str.is_empty() || !row_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    // Letters beyond "XFD" overflow well before u32 does, but keep it checked
    let col = col_from_label(col_str).ok_or_else(malformed)?;
    let row: u32 = row_str.parse().map_err(|_| malformed())?;

    if row == 0 {
        return Err(malformed()); // Rows are 1-indexed in A1 notation
    }

    let id = CellId::checked(row - 1, col)?;
    Ok((id.row, id.col))
}

/// Convert column index (0-indexed) to label (A, B, ..., Z, AA, AB, ...)
pub fn col_to_label(col: u32) -> String {
    let mut label = String::new();
    let mut n = col as u64 + 1; // 1-indexed for calculation

    while n > 0 {
        n -= 1;
        label.insert(0, char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }

    label
}

/// Convert column label (A, B, ..., Z, AA, AB, ...) to index (0-indexed)
pub fn col_from_label(label: &str) -> Option<u32> {
    let mut col: u32 = 0;

    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }

    col.checked_sub(1) // Convert to 0-indexed
}

/// A rectangular range of cells (e.g., A1:B10), normalized top-left to bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellId,
    pub end: CellId,
}

impl CellRange {
    pub fn new(a: CellId, b: CellId) -> Self {
        CellRange {
            start: CellId::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellId::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Smallest range covering every id in the iterator
    pub fn bounding<'a>(ids: impl IntoIterator<Item = &'a CellId>) -> Option<Self> {
        let mut ids = ids.into_iter();
        let first = *ids.next()?;
        Some(ids.fold(CellRange::new(first, first), |acc, id| {
            CellRange::new(
                CellId::new(acc.start.row.min(id.row), acc.start.col.min(id.col)),
                CellId::new(acc.end.row.max(id.row), acc.end.col.max(id.col)),
            )
        }))
    }

    /// Check if an id is within this range
    pub fn contains(&self, id: CellId) -> bool {
        id.row >= self.start.row
            && id.row <= self.end.row
            && id.col >= self.start.col
            && id.col <= self.end.col
    }

    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Total number of cells, widened so full-sheet ranges don't overflow
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    /// Iterate over all ids in the range (row by row)
    pub fn iter(&self) -> CellRangeIter {
        CellRangeIter {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl IntoIterator for CellRange {
    type Item = CellId;
    type IntoIter = CellRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over ids in a range
pub struct CellRangeIter {
    range: CellRange,
    current_row: u32,
    current_col: u32,
}

impl Iterator for CellRangeIter {
    type Item = CellId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row > self.range.end.row {
            return None;
        }

        let id = CellId::new(self.current_row, self.current_col);

        if self.current_col >= self.range.end.col {
            self.current_col = self.range.start.col;
            self.current_row += 1;
        } else {
            self.current_col += 1;
        }

        Some(id)
    }
}

/// Full rectangular span between two corners, inclusive, in row-major order
pub fn range(a: CellId, b: CellId) -> Vec<CellId> {
    CellRange::new(a, b).iter().collect()
}

/// Like [`range`], but from A1 strings; an undecodable corner yields an empty span
pub fn range_ids(a: &str, b: &str) -> Vec<CellId> {
    match (CellId::from_a1(a), CellId::from_a1(b)) {
        (Ok(a), Ok(b)) => range(a, b),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_col_to_label() {
        assert_eq!(col_to_label(0), "A");
        assert_eq!(col_to_label(25), "Z");
        assert_eq!(col_to_label(26), "AA");
        assert_eq!(col_to_label(701), "ZZ");
        assert_eq!(col_to_label(702), "AAA");
        assert_eq!(col_to_label(MAX_COLS - 1), "XFD");
    }

    #[test]
    fn test_col_from_label() {
        assert_eq!(col_from_label("A"), Some(0));
        assert_eq!(col_from_label("AB"), Some(27));
        assert_eq!(col_from_label("XFD"), Some(16_383));
        assert_eq!(col_from_label(""), None);
        assert_eq!(col_from_label("ZZZZZZZZZZ"), None);
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("A1"), Ok((0, 0)));
        assert_eq!(decode("AA100"), Ok((99, 26)));
        assert_eq!(decode("b2"), Ok((1, 1)));
        assert!(matches!(decode("A0"), Err(CoordinateError::Malformed(_))));
        assert!(matches!(decode("1A"), Err(CoordinateError::Malformed(_))));
        assert!(matches!(decode("A1B"), Err(CoordinateError::Malformed(_))));
        assert!(matches!(decode(""), Err(CoordinateError::Malformed(_))));
        assert!(matches!(decode("XFE1"), Err(CoordinateError::OutOfBounds { .. })));
        assert!(matches!(decode("A1048577"), Err(CoordinateError::OutOfBounds { .. })));
    }

    #[test]
    fn test_neighbor_clamps_to_bounds() {
        let a1 = CellId::new(0, 0);
        assert_eq!(a1.neighbor(-1, 0, 50, 30), None);
        assert_eq!(a1.neighbor(0, -1, 50, 30), None);
        assert_eq!(a1.neighbor(1, 0, 50, 30), Some(CellId::new(1, 0)));

        let edge = CellId::new(49, 29);
        assert_eq!(edge.neighbor(1, 0, 50, 30), None);
        assert_eq!(edge.neighbor(0, 1, 50, 30), None);
        assert_eq!(edge.neighbor(0, -1, 50, 30), Some(CellId::new(49, 28)));
    }

    #[test]
    fn test_range_any_corner_order() {
        let forward = range_ids("A1", "B2");
        let backward = range_ids("B2", "A1");
        let mixed = range_ids("B1", "A2");

        let expected: Vec<CellId> = ["A1", "B1", "A2", "B2"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(forward, expected);
        assert_eq!(backward, expected);
        assert_eq!(mixed, expected);
    }

    #[test]
    fn test_range_with_bad_corner_is_empty() {
        assert!(range_ids("A1", "1A").is_empty());
    }

    #[test]
    fn test_serde_as_a1_string() {
        let id = CellId::new(4, 27);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"AB5\"");
        let back: CellId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<CellId>("\"nope\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_encode_decode_round_trip(row in 0..MAX_ROWS, col in 0..MAX_COLS) {
            prop_assert_eq!(decode(&encode(row, col)), Ok((row, col)));
        }
    }
}
