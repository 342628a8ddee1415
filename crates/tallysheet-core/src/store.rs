use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

use crate::cell::CellData;
use crate::cell_id::{CellId, CellRange};
use crate::style::{CellStyle, StyleAttr};

/// Sparse cell storage - only non-empty cells are stored.
///
/// Empty cells are conceptual: an id absent from the map is a blank cell with
/// default style. Every mutation goes through methods that drop a cell as soon
/// as it has neither content nor style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellStore {
    cells: BTreeMap<CellId, CellData>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a reference to a cell
    pub fn get(&self, id: CellId) -> Option<&CellData> {
        self.cells.get(&id)
    }

    /// Display value of a cell ("" for blank cells)
    pub fn value(&self, id: CellId) -> &str {
        self.cells.get(&id).map(|c| c.value.as_str()).unwrap_or("")
    }

    /// Raw input of a cell ("" for blank cells)
    pub fn raw(&self, id: CellId) -> &str {
        self.cells.get(&id).map(|c| c.raw.as_str()).unwrap_or("")
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    /// Insert a whole cell (keyed by its own id); empty cells are removed instead
    pub fn insert(&mut self, cell: CellData) {
        if cell.is_empty() {
            self.cells.remove(&cell.id);
        } else {
            self.cells.insert(cell.id, cell);
        }
    }

    /// Set raw input, keeping any existing style. The value is provisionally
    /// the raw text until a recalculation overwrites it.
    pub fn set_raw(&mut self, id: CellId, raw: &str) {
        match self.cells.entry(id) {
            btree_map::Entry::Occupied(mut entry) => {
                if raw.is_empty() && entry.get().style.is_default() {
                    entry.remove();
                } else {
                    let cell = entry.get_mut();
                    cell.raw = raw.to_string();
                    cell.value = raw.to_string();
                }
            }
            btree_map::Entry::Vacant(entry) => {
                if !raw.is_empty() {
                    entry.insert(CellData::new(id, raw));
                }
            }
        }
    }

    /// Overwrite the computed value of an existing cell
    pub fn set_value(&mut self, id: CellId, value: impl Into<String>) {
        if let Some(cell) = self.cells.get_mut(&id) {
            cell.value = value.into();
        }
    }

    /// Apply a style edit, creating a style-only cell if needed
    pub fn apply_style(&mut self, id: CellId, attr: StyleAttr) {
        let mut cell = self
            .cells
            .remove(&id)
            .unwrap_or_else(|| CellData::styled(id, CellStyle::default()));
        cell.style.apply(attr);
        self.insert(cell);
    }

    /// Remove a cell (make it empty)
    pub fn remove(&mut self, id: CellId) -> Option<CellData> {
        self.cells.remove(&id)
    }

    /// Number of stored (non-empty) cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Iterate over stored cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &CellData> + '_ {
        self.cells.values()
    }

    /// Iterate over stored ids in row-major order
    pub fn ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.keys().copied()
    }

    /// Remove and return every cell matching the predicate
    pub fn drain_where(&mut self, mut pred: impl FnMut(&CellData) -> bool) -> Vec<CellData> {
        let ids: Vec<CellId> = self
            .cells
            .values()
            .filter(|c| pred(c))
            .map(|c| c.id)
            .collect();
        ids.into_iter().filter_map(|id| self.cells.remove(&id)).collect()
    }

    /// Bounding box of stored cells (the used range)
    pub fn used_range(&self) -> Option<CellRange> {
        CellRange::bounding(self.cells.keys())
    }
}

impl FromIterator<CellData> for CellStore {
    fn from_iter<I: IntoIterator<Item = CellData>>(iter: I) -> Self {
        let mut store = CellStore::new();
        for cell in iter {
            store.insert(cell);
        }
        store
    }
}
