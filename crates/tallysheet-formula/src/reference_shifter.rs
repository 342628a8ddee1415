use tallysheet_core::{MAX_COLS, MAX_ROWS};

use crate::ast::{RefNode, Reference};
use crate::parser::parse;

/// Rewrite formula references after rows are inserted or deleted.
///
/// # Arguments
/// * `formula` - The formula string (e.g., "=A1+B2")
/// * `at_row` - The first inserted/deleted row (0-indexed)
/// * `delta` - Positive for insert (shift down), negative for delete (shift up)
///
/// Every reference at or below `at_row` moves, absolute or not, because the
/// cell it names has moved. A reference into deleted rows becomes `#REF!`; a
/// range loses only its deleted rows.
///
/// # Returns
/// The rewritten formula, or `None` if the formula does not parse.
///
/// # Examples
///
/// Insert rows:
/// ```
/// use tallysheet_formula::shift_formula_rows;
///
/// assert_eq!(shift_formula_rows("=A1+B3", 2, 2), Some("=A1+B5".to_string()));
/// ```
///
/// Delete rows:
/// ```
/// use tallysheet_formula::shift_formula_rows;
///
/// assert_eq!(shift_formula_rows("=A1+B3", 1, -1), Some("=A1+B2".to_string()));
/// assert_eq!(shift_formula_rows("=A1+B3", 2, -1), Some("=A1+#REF!".to_string()));
/// ```
///
/// Ranges shrink around deleted rows:
/// ```
/// use tallysheet_formula::shift_formula_rows;
///
/// assert_eq!(shift_formula_rows("=SUM($A$1:A5)", 1, -2), Some("=SUM($A$1:A3)".to_string()));
/// ```
pub fn shift_formula_rows(formula: &str, at_row: u32, delta: i64) -> Option<String> {
    let expr = parse(formula).ok()?;

    let shifted = expr.map_refs(&mut |node| match node {
        RefNode::Cell(r) => {
            shift_row(r.row, at_row, delta).map(|row| RefNode::Cell(Reference { row, ..r }))
        }
        RefNode::Range(start, end) => shift_row_span(start, end, at_row, delta),
    });

    Some(format!("={}", shifted))
}

/// Rewrite the relative references of a formula moved by (d_row, d_col), as
/// when it is pasted or its row is sorted to a new position.
///
/// Absolute components (`$A`, `$1`) stay put. A reference pushed off the grid
/// becomes `#REF!`.
///
/// ```
/// use tallysheet_formula::shift_formula_offset;
///
/// assert_eq!(shift_formula_offset("=A1*$B$1", 2, 1), Some("=B3*$B$1".to_string()));
/// assert_eq!(shift_formula_offset("=A$1+B2", -1, 0), Some("=A$1+B1".to_string()));
/// assert_eq!(shift_formula_offset("=A1", -1, 0), Some("=#REF!".to_string()));
/// ```
pub fn shift_formula_offset(formula: &str, d_row: i64, d_col: i64) -> Option<String> {
    let expr = parse(formula).ok()?;

    let offset = |r: Reference| -> Option<Reference> {
        let row = if r.abs_row { Some(r.row) } else { add(r.row, d_row, MAX_ROWS) }?;
        let col = if r.abs_col { Some(r.col) } else { add(r.col, d_col, MAX_COLS) }?;
        Some(Reference { row, col, ..r })
    };

    let shifted = expr.map_refs(&mut |node| match node {
        RefNode::Cell(r) => offset(r).map(RefNode::Cell),
        RefNode::Range(start, end) => Some(RefNode::Range(offset(start)?, offset(end)?)),
    });

    Some(format!("={}", shifted))
}

fn add(value: u32, delta: i64, limit: u32) -> Option<u32> {
    let moved = value as i64 + delta;
    (0..limit as i64).contains(&moved).then_some(moved as u32)
}

/// New row for a single reference, `None` if it was deleted or pushed off the grid
fn shift_row(row: u32, at_row: u32, delta: i64) -> Option<u32> {
    if row < at_row {
        return Some(row);
    }
    if delta < 0 && (row as i64) < at_row as i64 - delta {
        return None;
    }
    add(row, delta, MAX_ROWS)
}

fn shift_row_span(start: Reference, end: Reference, at_row: u32, delta: i64) -> Option<RefNode> {
    // Normalize so start is the top corner
    let (mut top, mut bottom) = if start.row <= end.row {
        (start, end)
    } else {
        (end, start)
    };

    if delta >= 0 {
        top.row = shift_row(top.row, at_row, delta)?;
        bottom.row = shift_row(bottom.row, at_row, delta).unwrap_or(MAX_ROWS - 1);
        return Some(RefNode::Range(top, bottom));
    }

    let deleted_end = at_row as i64 - delta; // exclusive
    let new_top = match shift_row(top.row, at_row, delta) {
        Some(row) => row,
        // Top was deleted: the range now starts where the deletion was
        None => at_row,
    };
    let new_bottom = match shift_row(bottom.row, at_row, delta) {
        Some(row) => row,
        // Bottom was deleted: the range now ends just above the deletion
        None => at_row.checked_sub(1)?,
    };

    if top.row >= at_row && (bottom.row as i64) < deleted_end {
        return None; // Whole range deleted
    }
    if new_top > new_bottom {
        return None;
    }

    top.row = new_top;
    bottom.row = new_bottom;
    Some(RefNode::Range(top, bottom))
}
