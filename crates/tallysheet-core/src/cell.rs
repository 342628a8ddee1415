use serde::{Deserialize, Serialize};

use crate::cell_id::CellId;
use crate::style::CellStyle;

/// One non-empty cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    pub id: CellId,
    /// Literal user input; a formula starts with `=`
    pub raw: String,
    /// Computed display value (equal to `raw` for non-formulas)
    pub value: String,
    #[serde(default)]
    pub style: CellStyle,
}

impl CellData {
    /// Create a cell whose value is provisionally its raw input
    pub fn new(id: CellId, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        CellData {
            id,
            value: raw.clone(),
            raw,
            style: CellStyle::default(),
        }
    }

    /// Create a style-only cell with no content
    pub fn styled(id: CellId, style: CellStyle) -> Self {
        CellData {
            id,
            raw: String::new(),
            value: String::new(),
            style,
        }
    }

    /// Builder pattern: set style
    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }

    /// Check if this is a formula
    pub fn is_formula(&self) -> bool {
        is_formula(&self.raw)
    }

    /// Empty content and default style: such a cell must not be stored
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.style.is_default()
    }

    /// Same content relocated to another id
    pub fn moved_to(&self, id: CellId) -> Self {
        CellData { id, ..self.clone() }
    }
}

/// Whether a raw input is a formula
pub fn is_formula(raw: &str) -> bool {
    raw.starts_with('=')
}
