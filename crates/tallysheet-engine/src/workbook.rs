use tallysheet_core::{Axis, CellId, GridBounds};

use crate::clipboard::ClipboardSnapshot;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::navigation::Direction;
use crate::sheet::Sheet;
use crate::sort::SortDirection;

/// Ordered sheets plus the state shared between them: the clipboard, the
/// soft grid size and the configuration every sheet is created with.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active_sheet_index: usize,
    clipboard: Option<ClipboardSnapshot>,
    grid: GridBounds,
    config: EngineConfig,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Workbook {
    /// Create a new workbook with one empty sheet
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sheet(Sheet::with_config("Sheet 1", config), config)
    }

    /// Create a workbook holding the demo budget sheet
    pub fn demo(config: EngineConfig) -> Self {
        Self::with_sheet(Sheet::demo(config), config)
    }

    fn with_sheet(sheet: Sheet, config: EngineConfig) -> Self {
        Self {
            sheets: vec![sheet],
            active_sheet_index: 0,
            clipboard: None,
            grid: GridBounds::new(config.initial_rows, config.initial_cols),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn active_sheet(&self) -> &Sheet {
        &self.sheets[self.active_sheet_index]
    }

    pub fn active_sheet_mut(&mut self) -> &mut Sheet {
        &mut self.sheets[self.active_sheet_index]
    }

    pub fn active_sheet_index(&self) -> usize {
        self.active_sheet_index
    }

    pub fn get_sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn get_sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Set the active sheet by index
    pub fn set_active_sheet(&mut self, index: usize) -> bool {
        if index < self.sheets.len() {
            self.active_sheet_index = index;
            true
        } else {
            false
        }
    }

    /// Append an empty sheet with the given name
    pub fn add_sheet(&mut self, name: impl Into<String>) -> Result<usize, EngineError> {
        let name = name.into();
        self.check_name(&name, None)?;

        let index = self.sheets.len();
        self.sheets.push(Sheet::with_config(name, self.config));
        Ok(index)
    }

    /// Append a sheet named "Sheet N" and make it active
    pub fn add_sheet_auto(&mut self) -> usize {
        let mut num = self.sheets.len() + 1;
        let name = loop {
            let name = format!("Sheet {}", num);
            if !self.sheets.iter().any(|s| s.name == name) {
                break name;
            }
            num += 1;
        };

        let index = self.sheets.len();
        self.sheets.push(Sheet::with_config(name, self.config));
        self.active_sheet_index = index;
        index
    }

    /// Remove a sheet by index
    pub fn remove_sheet(&mut self, index: usize) -> Result<Sheet, EngineError> {
        if self.sheets.len() <= 1 {
            return Err(EngineError::CannotDeleteLastSheet);
        }
        if index >= self.sheets.len() {
            return Err(EngineError::SheetNotFound(index));
        }

        let sheet = self.sheets.remove(index);

        if self.active_sheet_index >= self.sheets.len() {
            self.active_sheet_index = self.sheets.len() - 1;
        } else if self.active_sheet_index > index {
            self.active_sheet_index -= 1;
        }

        Ok(sheet)
    }

    pub fn rename_sheet(&mut self, index: usize, name: impl Into<String>) -> Result<(), EngineError> {
        let name = name.into();
        self.check_name(&name, Some(index))?;

        let sheet = self
            .sheets
            .get_mut(index)
            .ok_or(EngineError::SheetNotFound(index))?;
        sheet.name = name;
        Ok(())
    }

    fn check_name(&self, name: &str, skip: Option<usize>) -> Result<(), EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidSheetName("name cannot be empty".to_string()));
        }
        let taken = self
            .sheets
            .iter()
            .enumerate()
            .any(|(i, s)| Some(i) != skip && s.name == name);
        if taken {
            return Err(EngineError::SheetNameExists(name.to_string()));
        }
        Ok(())
    }

    pub fn clipboard(&self) -> Option<&ClipboardSnapshot> {
        self.clipboard.as_ref()
    }

    /// Copy the active sheet's selection. The previous clipboard is replaced.
    pub fn copy(&mut self) -> bool {
        self.clipboard = self.active_sheet().copy();
        self.clipboard.is_some()
    }

    pub fn cut(&mut self) -> bool {
        self.clipboard = self.active_sheet_mut().cut();
        self.clipboard.is_some()
    }

    /// Paste the clipboard at the active sheet's cursor; the clipboard is kept
    pub fn paste(&mut self) -> Vec<CellId> {
        let Some(snapshot) = &self.clipboard else {
            return Vec::new();
        };
        self.sheets[self.active_sheet_index].paste(snapshot)
    }

    pub fn navigate(&mut self, direction: Direction, extend: bool) -> bool {
        let grid = self.grid;
        self.active_sheet_mut().navigate(direction, extend, &grid)
    }

    pub fn set_cell_raw(&mut self, id: CellId, raw: &str) {
        self.active_sheet_mut().set_cell_raw(id, raw);
    }

    /// Insert a row above the active cell
    pub fn insert_row(&mut self) {
        let sheet = self.active_sheet_mut();
        let row = sheet.active().row;
        sheet.insert_row(row);
    }

    /// Delete the active cell's row
    pub fn delete_row(&mut self) {
        let sheet = self.active_sheet_mut();
        let row = sheet.active().row;
        sheet.delete_row(row);
    }

    /// Sort by the active cell's column
    pub fn sort(&mut self, direction: SortDirection) {
        let sheet = self.active_sheet_mut();
        let col = sheet.active().col;
        sheet.sort(col, direction);
    }

    pub fn auto_sum(&mut self) -> bool {
        let sheet = self.active_sheet_mut();
        let target = sheet.active();
        sheet.auto_sum(target)
    }

    pub fn grid(&self) -> GridBounds {
        self.grid
    }

    pub fn expand_grid(&mut self, axis: Axis) -> bool {
        self.grid.expand(axis)
    }

    /// Fit the grid to the active sheet's used range plus a buffer
    pub fn trim_grid(&mut self) -> bool {
        let sheet = &self.sheets[self.active_sheet_index];
        let trimmed = self.grid.trim(sheet.store().used_range(), sheet.active());
        if trimmed {
            tracing::debug!("Trimmed grid to {} x {}", self.grid.rows, self.grid.cols);
        }
        trimmed
    }

    /// Active sheet's display values, bounded by both the limits and the grid
    pub fn export_rows(&self, max_rows: u32, max_cols: u32) -> Vec<Vec<String>> {
        self.active_sheet()
            .export_rows(max_rows.min(self.grid.rows), max_cols.min(self.grid.cols))
    }
}
