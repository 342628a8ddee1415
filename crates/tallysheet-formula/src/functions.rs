//! Aggregate functions. Each takes the numeric contributions of its
//! arguments, with ranges already expanded and blanks dropped.

use crate::error::FormulaError;

pub type Function = fn(&[f64]) -> Result<f64, FormulaError>;

/// Resolve a (case-insensitive) function name
pub fn lookup(name: &str) -> Option<Function> {
    let func: Function = match name.to_ascii_uppercase().as_str() {
        "SUM" => sum,
        "AVERAGE" | "AVG" => average,
        "MIN" => min,
        "MAX" => max,
        "COUNT" => count,
        _ => return None,
    };
    Some(func)
}

/// SUM - Sum all numeric values
pub fn sum(values: &[f64]) -> Result<f64, FormulaError> {
    Ok(values.iter().sum())
}

/// AVERAGE - Average of numeric values
pub fn average(values: &[f64]) -> Result<f64, FormulaError> {
    if values.is_empty() {
        return Err(FormulaError::DivisionByZero);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// MIN - Minimum numeric value (0 when there is none)
pub fn min(values: &[f64]) -> Result<f64, FormulaError> {
    Ok(values.iter().copied().reduce(f64::min).unwrap_or(0.0))
}

/// MAX - Maximum numeric value (0 when there is none)
pub fn max(values: &[f64]) -> Result<f64, FormulaError> {
    Ok(values.iter().copied().reduce(f64::max).unwrap_or(0.0))
}

/// COUNT - Count numeric values
pub fn count(values: &[f64]) -> Result<f64, FormulaError> {
    Ok(values.len() as f64)
}
