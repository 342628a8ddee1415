pub mod aggregate;
pub mod cell;
pub mod cell_id;
pub mod error;
pub mod grid;
pub mod numeric;
pub mod store;
pub mod style;

pub use aggregate::{aggregate, SelectionStats};
pub use cell::{is_formula, CellData};
pub use cell_id::{
    col_from_label, col_to_label, decode, encode, range, range_ids, CellId, CellRange, MAX_COLS,
    MAX_ROWS,
};
pub use error::CoordinateError;
pub use grid::{Axis, GridBounds};
pub use numeric::{coerce_number, format_number, parse_float_prefix};
pub use store::CellStore;
pub use style::{CellStyle, Color, HorizontalAlign, NumberFormat, StyleAttr};
