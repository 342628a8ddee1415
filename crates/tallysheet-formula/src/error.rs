use thiserror::Error;

/// Marker written into a cell's value when evaluation fails
pub const ERROR_MARKER: &str = "#ERROR";
/// Marker for cells caught in a circular reference
pub const CYCLE_MARKER: &str = "#CYCLE";
/// Marker for formulas whose reference was deleted
pub const REF_MARKER: &str = "#REF!";

/// Why a formula could not produce a value.
///
/// These never escape an editing operation: each one is rendered in-band as a
/// marker string via [`FormulaError::marker`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("parse error at position {position}: {message}")]
    Parse { message: String, position: usize },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("value is not numeric: {0:?}")]
    InvalidOperand(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("range used outside a function argument")]
    RangeOutsideFunction,

    #[error("reference to a deleted cell")]
    InvalidReference,

    #[error("circular reference")]
    Circular,

    /// A referenced cell already holds an error marker
    #[error("referenced cell holds an error")]
    Upstream,
}

impl FormulaError {
    /// In-band display marker for this error
    pub fn marker(&self) -> &'static str {
        match self {
            FormulaError::InvalidReference => REF_MARKER,
            FormulaError::Circular => CYCLE_MARKER,
            _ => ERROR_MARKER,
        }
    }

    /// Recognize a value that is itself an error marker
    pub fn from_marker(value: &str) -> Option<Self> {
        match value {
            ERROR_MARKER => Some(FormulaError::Upstream),
            CYCLE_MARKER => Some(FormulaError::Circular),
            REF_MARKER => Some(FormulaError::InvalidReference),
            _ => None,
        }
    }
}

/// Whether a display value is one of the error markers
pub fn is_error_marker(value: &str) -> bool {
    FormulaError::from_marker(value).is_some()
}
