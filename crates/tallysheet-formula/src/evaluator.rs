use serde::{Deserialize, Serialize};
use tallysheet_core::{coerce_number, format_number, CellId, CellRange, CellStore};

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::FormulaError;
use crate::functions;

/// How text is treated where a number is required
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericMode {
    /// Unparsable text counts as zero
    #[default]
    Lenient,
    /// Unparsable text is an [`FormulaError::InvalidOperand`]
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalOptions {
    pub numeric_mode: NumericMode,
}

/// Intermediate result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Empty,
}

impl Value {
    /// Coerce to a number for arithmetic
    pub fn to_number(&self, mode: NumericMode) -> Result<f64, FormulaError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Empty => Ok(0.0),
            Value::Text(s) => match (coerce_number(s), mode) {
                (Some(n), _) => Ok(n),
                (None, NumericMode::Lenient) => Ok(0.0),
                (None, NumericMode::Strict) => Err(FormulaError::InvalidOperand(s.clone())),
            },
        }
    }

    /// Render as a cell display value; a bare empty reference shows `0`
    pub fn display(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Empty => "0".to_string(),
        }
    }
}

/// Evaluates a parsed formula against the current values in a store.
///
/// References read the stored `value` of their target as-is; keeping those
/// values fresh is the recalculation engine's job.
pub struct Evaluator<'a> {
    store: &'a CellStore,
    options: EvalOptions,
}

impl<'a> Evaluator<'a> {
    pub fn new(store: &'a CellStore, options: EvalOptions) -> Self {
        Self { store, options }
    }

    /// Evaluate an expression AST to a value
    pub fn evaluate(&self, expr: &Expr) -> Result<Value, FormulaError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::CellRef(r) => self.cell_value(r.id()),
            Expr::Range { .. } => Err(FormulaError::RangeOutsideFunction),
            Expr::InvalidRef => Err(FormulaError::InvalidReference),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => Ok(Value::Number(-self.number(operand)?)),
            Expr::Binary { left, op, right } => {
                let a = self.number(left)?;
                let b = self.number(right)?;
                if b == 0.0 && *op == BinaryOp::Div {
                    return Err(FormulaError::DivisionByZero);
                }
                finite(op.apply(a, b))
            }
            Expr::Function { name, args } => self.evaluate_function(name, args),
            Expr::Grouped(inner) => self.evaluate(inner),
        }
    }

    fn number(&self, expr: &Expr) -> Result<f64, FormulaError> {
        self.evaluate(expr)?.to_number(self.options.numeric_mode)
    }

    fn cell_value(&self, id: CellId) -> Result<Value, FormulaError> {
        let value = self.store.value(id);
        if value.is_empty() {
            return Ok(Value::Empty);
        }
        match FormulaError::from_marker(value) {
            Some(err) => Err(err),
            None => Ok(Value::Text(value.to_string())),
        }
    }

    fn evaluate_function(&self, name: &str, args: &[Expr]) -> Result<Value, FormulaError> {
        let func = functions::lookup(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

        let mut numbers = Vec::new();
        for arg in args {
            match arg {
                Expr::Range { start, end } => {
                    self.collect_range(CellRange::new(start.id(), end.id()), &mut numbers)?
                }
                other => match self.evaluate(other)? {
                    Value::Empty => {}
                    value => numbers.push(value.to_number(self.options.numeric_mode)?),
                },
            }
        }

        finite(func(&numbers)?)
    }

    /// Numeric values of the populated cells in a range, in row-major order.
    /// Blank and non-numeric cells are skipped; error markers propagate.
    fn collect_range(&self, range: CellRange, out: &mut Vec<f64>) -> Result<(), FormulaError> {
        let mut push = |value: &str| -> Result<(), FormulaError> {
            if let Some(err) = FormulaError::from_marker(value) {
                return Err(err);
            }
            if let Some(n) = coerce_number(value) {
                out.push(n);
            }
            Ok(())
        };

        // Walk whichever side is smaller: the range or the populated cells
        if range.cell_count() <= self.store.len() as u64 {
            for id in range {
                push(self.store.value(id))?;
            }
        } else {
            for cell in self.store.iter().filter(|c| range.contains(c.id)) {
                push(&cell.value)?;
            }
        }
        Ok(())
    }
}

fn finite(n: f64) -> Result<Value, FormulaError> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(FormulaError::InvalidOperand(n.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn store_with(values: &[(&str, &str)]) -> CellStore {
        let mut store = CellStore::new();
        for (id, v) in values {
            store.set_raw(id.parse().unwrap(), v);
        }
        store
    }

    fn eval_with(formula: &str, store: &CellStore, mode: NumericMode) -> Result<Value, FormulaError> {
        let expr = parse(formula)?;
        Evaluator::new(store, EvalOptions { numeric_mode: mode }).evaluate(&expr)
    }

    fn eval(formula: &str, store: &CellStore) -> Result<Value, FormulaError> {
        eval_with(formula, store, NumericMode::Lenient)
    }

    #[test]
    fn test_arithmetic() {
        let store = CellStore::new();
        assert_eq!(eval("=1+2*3", &store), Ok(Value::Number(7.0)));
        assert_eq!(eval("=(1+2)*3", &store), Ok(Value::Number(9.0)));
        assert_eq!(eval("=10/4", &store), Ok(Value::Number(2.5)));
        assert_eq!(eval("=-2*-3", &store), Ok(Value::Number(6.0)));
        assert_eq!(eval("=1/0", &store), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_references() {
        let store = store_with(&[("A1", "10"), ("B1", "$1,200"), ("C1", "hello")]);
        assert_eq!(eval("=A1*2", &store), Ok(Value::Number(20.0)));
        assert_eq!(eval("=B1+0", &store), Ok(Value::Number(1200.0)));
        assert_eq!(eval("=C1", &store), Ok(Value::Text("hello".to_string())));
        assert_eq!(eval("=Z9", &store), Ok(Value::Empty));
        assert_eq!(eval("=Z9+1", &store), Ok(Value::Number(1.0)));
    }

    #[test]
    fn test_numeric_modes() {
        let store = store_with(&[("A1", "abc")]);
        assert_eq!(eval("=A1+1", &store), Ok(Value::Number(1.0)));
        assert_eq!(
            eval_with("=A1+1", &store, NumericMode::Strict),
            Err(FormulaError::InvalidOperand("abc".to_string()))
        );
    }

    #[test]
    fn test_error_markers_propagate() {
        let store = store_with(&[("A1", "#ERROR"), ("A2", "#REF!")]);
        assert_eq!(eval("=A1+1", &store), Err(FormulaError::Upstream));
        assert_eq!(eval("=SUM(A1:A3)", &store), Err(FormulaError::Upstream));
        assert_eq!(eval("=A2", &store), Err(FormulaError::InvalidReference));
    }

    #[test]
    fn test_range_outside_function() {
        let store = CellStore::new();
        assert_eq!(eval("=A1:B2", &store), Err(FormulaError::RangeOutsideFunction));
        assert_eq!(eval("=A1:B2+1", &store), Err(FormulaError::RangeOutsideFunction));
    }

    #[test]
    fn test_functions() {
        let store = store_with(&[("A1", "5"), ("A2", "abc"), ("A3", "10")]);
        assert_eq!(eval("=SUM(A1:A4)", &store), Ok(Value::Number(15.0)));
        assert_eq!(eval("=SUM(A1:A3, 5)", &store), Ok(Value::Number(20.0)));
        assert_eq!(eval("=AVERAGE(A1:A3)", &store), Ok(Value::Number(7.5)));
        assert_eq!(eval("=MIN(A1:A3)", &store), Ok(Value::Number(5.0)));
        assert_eq!(eval("=MAX(A1:A3)", &store), Ok(Value::Number(10.0)));
        assert_eq!(eval("=COUNT(A1:A3)", &store), Ok(Value::Number(2.0)));
        assert_eq!(
            eval("=FOO(A1)", &store),
            Err(FormulaError::UnknownFunction("FOO".to_string()))
        );
    }

    #[test]
    fn test_sum_over_huge_range_scans_store() {
        let store = store_with(&[("A1", "1"), ("XFD1048576", "2")]);
        assert_eq!(eval("=SUM(A1:XFD1048576)", &store), Ok(Value::Number(3.0)));
    }
}
