use serde::Serialize;

use crate::cell_id::CellId;
use crate::numeric::coerce_number;
use crate::store::CellStore;

/// Status-bar statistics for a multi-cell selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectionStats {
    pub sum: f64,
    /// Cells with a non-empty value, numeric or not
    pub count: usize,
    pub average: f64,
    pub has_numeric: bool,
}

/// Aggregate the selected cells' display values.
///
/// Returns `None` for selections of zero or one cell.
pub fn aggregate(selection: &[CellId], store: &CellStore) -> Option<SelectionStats> {
    if selection.len() <= 1 {
        return None;
    }

    let mut sum = 0.0;
    let mut count = 0;
    let mut numeric_count = 0;

    for value in selection.iter().map(|id| store.value(*id)) {
        if value.is_empty() {
            continue;
        }
        count += 1;
        if let Some(n) = coerce_number(value) {
            sum += n;
            numeric_count += 1;
        }
    }

    Some(SelectionStats {
        sum,
        count,
        average: if numeric_count > 0 {
            sum / numeric_count as f64
        } else {
            0.0
        },
        has_numeric: numeric_count > 0,
    })
}
