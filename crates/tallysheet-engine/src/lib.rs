//! Spreadsheet editing engine: sheets that keep their formulas, dependency
//! graph and cached values consistent across edits and structural changes.
//!
//! ```
//! use tallysheet_core::CellId;
//! use tallysheet_engine::Sheet;
//!
//! let mut sheet = Sheet::new("Sheet 1");
//! sheet.set_cell_raw(CellId::new(0, 0), "1");
//! sheet.set_cell_raw(CellId::new(0, 1), "=A1*2");
//! sheet.set_cell_raw(CellId::new(0, 0), "5");
//! assert_eq!(sheet.store().value(CellId::new(0, 1)), "10");
//! ```

pub mod autosum;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod export;
pub mod navigation;
pub mod recalc;
pub mod sheet;
pub mod sort;
pub mod structure;
pub mod workbook;

pub use clipboard::ClipboardSnapshot;
pub use config::{CyclePolicy, EngineConfig, RecalcOrder, ReferenceAdjustment};
pub use error::{ConfigError, EngineError};
pub use export::to_csv_lines;
pub use navigation::Direction;
pub use sheet::{Sheet, DEFAULT_COL_WIDTH, DEFAULT_ROW_HEIGHT};
pub use sort::SortDirection;
pub use workbook::Workbook;
