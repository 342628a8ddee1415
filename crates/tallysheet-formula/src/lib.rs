pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod reference_shifter;

pub use ast::{BinaryOp, Expr, RefNode, RefTarget, Reference, UnaryOp};
pub use dependency::{
    extract_dependencies, extract_large_ranges, DependencyGraph, RecalcPlan,
    MAX_DEPENDENCY_RANGE_CELLS,
};
pub use error::{is_error_marker, FormulaError, CYCLE_MARKER, ERROR_MARKER, REF_MARKER};
pub use evaluator::{EvalOptions, Evaluator, NumericMode, Value};
pub use parser::{parse, MAX_DEPTH, MAX_NESTING};
pub use reference_shifter::{shift_formula_offset, shift_formula_rows};

use tallysheet_core::{is_formula, CellStore};

/// Compute the display value for a raw cell input.
///
/// Non-formulas display as typed. Formula failures come back as `Err` so the
/// caller can log them before storing [`FormulaError::marker`].
pub fn try_evaluate(
    raw: &str,
    store: &CellStore,
    options: EvalOptions,
) -> Result<String, FormulaError> {
    if !is_formula(raw) {
        return Ok(raw.to_string());
    }
    let expr = parse(raw)?;
    Ok(Evaluator::new(store, options).evaluate(&expr)?.display())
}

/// Like [`try_evaluate`], with failures rendered as their error marker
pub fn evaluate(raw: &str, store: &CellStore, options: EvalOptions) -> String {
    try_evaluate(raw, store, options).unwrap_or_else(|e| e.marker().to_string())
}
