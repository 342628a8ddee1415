use thiserror::Error;

/// A cell id that cannot be decoded or lies outside the encodable grid.
///
/// These are recovered locally: ranges filter them out and navigation
/// treats them as "cannot move", so they never reach the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// Not of the form `[A-Z]+[0-9]+` with a row of at least 1
    #[error("malformed cell id: {0:?}")]
    Malformed(String),
    /// Zero-based coordinate beyond the maximum sheet size
    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: u32, col: u32 },
}
