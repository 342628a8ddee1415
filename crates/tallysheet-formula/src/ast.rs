use std::fmt;

use tallysheet_core::{col_to_label, format_number, CellId, CellRange};

/// A single cell reference as written in a formula (e.g. `B2`, `$A$1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub row: u32,
    pub col: u32,
    pub abs_row: bool, // A$1 vs A1
    pub abs_col: bool, // $A1 vs A1
}

impl Reference {
    pub const fn relative(row: u32, col: u32) -> Self {
        Reference {
            row,
            col,
            abs_row: false,
            abs_col: false,
        }
    }

    pub fn id(&self) -> CellId {
        CellId::new(self.row, self.col)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.abs_col { "$" } else { "" },
            col_to_label(self.col),
            if self.abs_row { "$" } else { "" },
            self.row + 1
        )
    }
}

/// Abstract Syntax Tree for formula expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    Number(f64),
    Text(String),

    CellRef(Reference),

    // Only meaningful as a function argument (e.g., SUM(A1:B10))
    Range { start: Reference, end: Reference },

    /// A reference whose target was deleted; renders as `#REF!`
    InvalidRef,

    Unary { op: UnaryOp, operand: Box<Expr> },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    Function { name: String, args: Vec<Expr> },

    // Parenthesized expression
    Grouped(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

impl Expr {
    /// Create a relative cell reference expression
    pub fn cell_ref(row: u32, col: u32) -> Self {
        Expr::CellRef(Reference::relative(row, col))
    }

    /// Create a range expression
    pub fn range(start: Reference, end: Reference) -> Self {
        Expr::Range { start, end }
    }

    /// Create a binary expression
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a negation
    pub fn neg(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        }
    }

    /// Create a function call expression
    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    /// Rebuild the tree with every reference and range passed through `f`.
    ///
    /// `f` returning `None` turns the node into [`Expr::InvalidRef`].
    pub fn map_refs(&self, f: &mut impl FnMut(RefNode) -> Option<RefNode>) -> Expr {
        let rebuilt = |node: Option<RefNode>| match node {
            Some(RefNode::Cell(r)) => Expr::CellRef(r),
            Some(RefNode::Range(start, end)) => Expr::Range { start, end },
            None => Expr::InvalidRef,
        };
        match self {
            Expr::CellRef(r) => rebuilt(f(RefNode::Cell(*r))),
            Expr::Range { start, end } => rebuilt(f(RefNode::Range(*start, *end))),
            Expr::Unary { op, operand } => Expr::Unary {
                op: *op,
                operand: Box::new(operand.map_refs(f)),
            },
            Expr::Binary { left, op, right } => Expr::Binary {
                left: Box::new(left.map_refs(f)),
                op: *op,
                right: Box::new(right.map_refs(f)),
            },
            Expr::Function { name, args } => Expr::Function {
                name: name.clone(),
                args: args.iter().map(|a| a.map_refs(f)).collect(),
            },
            Expr::Grouped(inner) => Expr::Grouped(Box::new(inner.map_refs(f))),
            Expr::Number(_) | Expr::Text(_) | Expr::InvalidRef => self.clone(),
        }
    }

    /// Visit every single reference and range in source order
    pub fn for_each_ref(&self, f: &mut impl FnMut(RefTarget)) {
        match self {
            Expr::CellRef(r) => f(RefTarget::Cell(r.id())),
            Expr::Range { start, end } => f(RefTarget::Range(CellRange::new(start.id(), end.id()))),
            Expr::Unary { operand, .. } => operand.for_each_ref(f),
            Expr::Binary { left, right, .. } => {
                left.for_each_ref(f);
                right.for_each_ref(f);
            }
            Expr::Function { args, .. } => args.iter().for_each(|a| a.for_each_ref(f)),
            Expr::Grouped(inner) => inner.for_each_ref(f),
            Expr::Number(_) | Expr::Text(_) | Expr::InvalidRef => {}
        }
    }
}

/// A reference node as written, handed to [`Expr::map_refs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefNode {
    Cell(Reference),
    Range(Reference, Reference),
}

/// What a reference in a formula points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    Cell(CellId),
    Range(CellRange),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", format_number(*n)),
            Expr::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::CellRef(r) => write!(f, "{}", r),
            Expr::Range { start, end } => write!(f, "{}:{}", start, end),
            Expr::InvalidRef => write!(f, "#REF!"),
            Expr::Unary { op: UnaryOp::Neg, operand } => write!(f, "-{}", operand),
            Expr::Binary { left, op, right } => write!(f, "{}{}{}", left, op, right),
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Grouped(inner) => write!(f, "({})", inner),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
        }
    }
}
