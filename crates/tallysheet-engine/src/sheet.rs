use serde::Serialize;
use std::collections::BTreeMap;

use tallysheet_core::{
    aggregate, range, CellData, CellId, CellStore, CellStyle, Color, HorizontalAlign,
    NumberFormat, SelectionStats, StyleAttr,
};
use tallysheet_formula::DependencyGraph;

use crate::config::EngineConfig;

/// Default row height in pixels
pub const DEFAULT_ROW_HEIGHT: f64 = 24.0;
/// Default column width in pixels
pub const DEFAULT_COL_WIDTH: f64 = 100.0;

/// A single sheet: sparse cells, the dependency graph over their formulas,
/// the cursor and selection, and row/column size overrides.
///
/// Every editing operation takes `&mut self` and runs to completion, including
/// recalculation, before returning.
#[derive(Debug, Clone, Serialize)]
pub struct Sheet {
    /// Sheet name (displayed in tab)
    pub name: String,
    pub(crate) store: CellStore,
    #[serde(skip)]
    pub(crate) graph: DependencyGraph,
    pub(crate) active: CellId,
    /// Moving end of the selection; differs from `active` while extending
    #[serde(skip)]
    pub(crate) focus: CellId,
    pub(crate) selection: Vec<CellId>,
    /// Custom column widths (column index -> width in pixels)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) col_widths: BTreeMap<u32, f64>,
    /// Custom row heights (row index -> height in pixels)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) row_heights: BTreeMap<u32, f64>,
    #[serde(skip)]
    pub(crate) config: EngineConfig,
}

impl Sheet {
    /// Create a new empty sheet with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, EngineConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: EngineConfig) -> Self {
        let origin = CellId::new(0, 0);
        Self {
            name: name.into(),
            store: CellStore::new(),
            graph: DependencyGraph::new(),
            active: origin,
            focus: origin,
            selection: vec![origin],
            col_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            config,
        }
    }

    /// Load a sheet from seed cells, then build the graph and settle every formula
    pub fn with_cells(
        name: impl Into<String>,
        config: EngineConfig,
        cells: impl IntoIterator<Item = CellData>,
    ) -> Self {
        let mut sheet = Self::with_config(name, config);
        for cell in cells {
            // Seed values are recomputed, never trusted
            let value = cell.raw.clone();
            sheet.store.insert(CellData { value, ..cell });
        }
        sheet.rebuild_dependency_graph();
        sheet.recalculate_all();
        sheet
    }

    /// The budget sheet a fresh workbook opens with
    pub fn demo(config: EngineConfig) -> Self {
        let header = CellStyle::new()
            .with(StyleAttr::Bold(true))
            .with(StyleAttr::Background(Some(Color::rgb(0xf1, 0xf5, 0xf9))))
            .with(StyleAttr::TextColor(Some(Color::rgb(0x47, 0x55, 0x69))));
        let currency = CellStyle::new().with(StyleAttr::NumberFormat(Some(NumberFormat::Currency)));

        let cell = |a1: &str, raw: &str, style: &CellStyle| match a1.parse::<CellId>() {
            Ok(id) => Some(CellData::new(id, raw).with_style(style.clone())),
            Err(_) => None,
        };
        let plain = CellStyle::default();

        let mut cells = vec![
            cell("A1", "Item", &header),
            cell("B1", "Cost", &header.clone().with(StyleAttr::NumberFormat(Some(NumberFormat::Currency)))),
            cell("C1", "Qty", &header),
            cell("D1", "Total", &header.clone().with(StyleAttr::NumberFormat(Some(NumberFormat::Currency)))),
        ];
        let items = [("MacBook Pro", "2400", "2"), ("Monitor", "500", "4"), ("Keyboard", "150", "5")];
        for (i, (item, cost, qty)) in items.iter().enumerate() {
            let row = i + 2;
            cells.push(cell(&format!("A{row}"), *item, &plain));
            cells.push(cell(&format!("B{row}"), *cost, &currency));
            cells.push(cell(&format!("C{row}"), *qty, &plain));
            cells.push(cell(&format!("D{row}"), &format!("=B{row}*C{row}"), &currency));
        }
        cells.push(cell(
            "C5",
            "Grand Total",
            &CellStyle::new()
                .with(StyleAttr::Bold(true))
                .with(StyleAttr::Align(Some(HorizontalAlign::Right))),
        ));
        cells.push(cell(
            "D5",
            "=SUM(D2:D4)",
            &CellStyle::new()
                .with(StyleAttr::Bold(true))
                .with(StyleAttr::TextColor(Some(Color::rgb(0x05, 0x96, 0x69))))
                .with(StyleAttr::Background(Some(Color::rgb(0xec, 0xfd, 0xf5))))
                .with(StyleAttr::NumberFormat(Some(NumberFormat::Currency))),
        ));

        Self::with_cells("Budget 2024", config, cells.into_iter().flatten())
    }

    pub fn get_cell(&self, id: CellId) -> Option<&CellData> {
        self.store.get(id)
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn active(&self) -> CellId {
        self.active
    }

    pub fn selection(&self) -> &[CellId] {
        &self.selection
    }

    /// Write raw input into a cell and recalculate everything that reads it.
    ///
    /// Old dependency edges are removed before the write and new ones
    /// installed after it, so the graph stays the inverse of the stored
    /// formulas. Formula failures land in the cell's value as markers.
    pub fn set_cell_raw(&mut self, id: CellId, raw: &str) {
        self.graph.unlink_formula(id, self.store.raw(id));

        self.store.set_raw(id, raw);

        self.graph.link_formula(id, raw);
        self.propagate(&[id]);
    }

    /// Apply one style edit to each of `ids`, creating style-only cells where needed
    pub fn set_cell_style(&mut self, ids: &[CellId], attr: StyleAttr) {
        for id in ids {
            self.store.apply_style(*id, attr);
        }
    }

    /// Statistics for the current selection, `None` for a single cell
    pub fn aggregate(&self) -> Option<SelectionStats> {
        aggregate(&self.selection, &self.store)
    }

    /// Move the cursor, or with `extend` grow the selection from the active cell
    pub fn select(&mut self, id: CellId, extend: bool) {
        if extend {
            self.selection = range(self.active, id);
        } else {
            self.active = id;
            self.selection = vec![id];
        }
        self.focus = id;
    }

    /// Select a dragged rectangle; `start` becomes the active cell
    pub fn select_range(&mut self, start: CellId, end: CellId) {
        self.active = start;
        self.focus = end;
        self.selection = range(start, end);
    }

    pub fn col_width(&self, col: u32) -> f64 {
        self.col_widths.get(&col).copied().unwrap_or(DEFAULT_COL_WIDTH)
    }

    /// Set the column width; the default width removes the override
    pub fn set_col_width(&mut self, col: u32, width: f64) {
        if (width - DEFAULT_COL_WIDTH).abs() < 0.01 {
            self.col_widths.remove(&col);
        } else {
            self.col_widths.insert(col, width);
        }
    }

    pub fn row_height(&self, row: u32) -> f64 {
        self.row_heights.get(&row).copied().unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    /// Set the row height; the default height removes the override
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        if (height - DEFAULT_ROW_HEIGHT).abs() < 0.01 {
            self.row_heights.remove(&row);
        } else {
            self.row_heights.insert(row, height);
        }
    }

    /// Drop every cell, edge and size override; cursor back to A1
    pub fn clear(&mut self) {
        let origin = CellId::new(0, 0);
        self.store.clear();
        self.graph.clear();
        self.col_widths.clear();
        self.row_heights.clear();
        self.active = origin;
        self.focus = origin;
        self.selection = vec![origin];
        tracing::debug!("Cleared sheet {:?}", self.name);
    }
}
