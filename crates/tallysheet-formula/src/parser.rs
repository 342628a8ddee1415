//! Nom-based formula parser.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr     := term (('+' | '-') term)*
//! term     := unary (('*' | '/') unary)*
//! unary    := '-'* primary
//! primary  := '(' expr ')' | string | number | '#REF!' | range | cell | call
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, one_of},
    combinator::{map, not, opt, peek, recognize, value},
    multi::{fold_many0, separated_list0},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use tallysheet_core::{col_from_label, CellId};

use crate::ast::{BinaryOp, Expr, Reference};
use crate::error::FormulaError;

/// Deepest parenthesis or function-call nesting a formula may use
pub const MAX_NESTING: usize = 64;

/// Tallest expression tree a formula may build. Every operator, negation,
/// group and call adds a level.
pub const MAX_DEPTH: usize = 256;

/// Skip whitespace
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn fail(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify))
}

/// Parse an unsigned decimal number (integer, float, optional exponent)
fn parse_number(input: &str) -> IResult<&str, Expr> {
    let (rest, num_str) = recognize(tuple((
        alt((
            recognize(pair(
                take_while1(|c: char| c.is_ascii_digit()),
                opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
            )),
            recognize(pair(char('.'), take_while1(|c: char| c.is_ascii_digit()))),
        )),
        opt(tuple((
            one_of("eE"),
            opt(one_of("+-")),
            take_while1(|c: char| c.is_ascii_digit()),
        ))),
    )))(input)?;

    let num: f64 = num_str.parse().map_err(|_| fail(input))?;
    Ok((rest, Expr::Number(num)))
}

/// Parse a double-quoted string literal; `""` escapes a quote
fn parse_string(input: &str) -> IResult<&str, Expr> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = input.char_indices().peekable();

    loop {
        match chars.next() {
            Some((i, '"')) => {
                if matches!(chars.peek(), Some((_, '"'))) {
                    result.push('"');
                    chars.next();
                } else {
                    return Ok((&input[i + 1..], Expr::Text(result)));
                }
            }
            Some((_, c)) => result.push(c),
            None => return Err(fail(input)),
        }
    }
}

/// Parse a cell reference (e.g., A1, $B$2, aa10), rejecting out-of-grid ids
fn parse_reference(input: &str) -> IResult<&str, Reference> {
    let (rest, (abs_col, letters, abs_row, digits)) = tuple((
        opt(char('$')),
        take_while1(|c: char| c.is_ascii_alphabetic()),
        opt(char('$')),
        take_while1(|c: char| c.is_ascii_digit()),
    ))(input)?;

    let col = col_from_label(letters).ok_or_else(|| fail(input))?;
    let row: u32 = digits.parse().map_err(|_| fail(input))?;
    let id = row
        .checked_sub(1)
        .and_then(|row| CellId::checked(row, col).ok())
        .ok_or_else(|| fail(input))?;

    Ok((
        rest,
        Reference {
            row: id.row,
            col: id.col,
            abs_row: abs_row.is_some(),
            abs_col: abs_col.is_some(),
        },
    ))
}

/// A reference not immediately followed by `(`, so `LOG10(` stays a call
fn parse_cell_ref(input: &str) -> IResult<&str, Reference> {
    let (rest, reference) = parse_reference(input)?;
    let (rest, _) = not(peek(preceded(multispace0, char('('))))(rest)?;
    Ok((rest, reference))
}

fn parse_range(input: &str) -> IResult<&str, Expr> {
    map(
        tuple((parse_cell_ref, ws(char(':')), parse_cell_ref)),
        |(start, _, end)| Expr::Range { start, end },
    )(input)
}

/// Parse an identifier (function name)
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
    ))(input)
}

/// A parsed subtree and its height
type Node = (Expr, usize);

fn too_deep(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Failure(nom::error::Error::new(
        input,
        nom::error::ErrorKind::TooLarge,
    ))
}

fn leaf(expr: Expr) -> Node {
    (expr, 1)
}

/// Spend one level of parenthesis/call nesting
fn nest(input: &str, remaining: usize) -> Result<usize, nom::Err<nom::error::Error<&str>>> {
    remaining.checked_sub(1).ok_or_else(|| too_deep(input))
}

fn checked(input: &str, expr: Expr, depth: usize) -> Result<Node, nom::Err<nom::error::Error<&str>>> {
    if depth > MAX_DEPTH {
        return Err(too_deep(input));
    }
    Ok((expr, depth))
}

fn parse_function_call<'a>(input: &'a str, nesting: usize) -> IResult<&'a str, Node> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = ws(char('('))(input)?;
    let nesting = nest(input, nesting)?;
    let (input, args) = separated_list0(ws(char(',')), |i: &'a str| expression(i, nesting))(input)?;
    let (input, _) = ws(char(')'))(input)?;

    let depth = args.iter().map(|(_, d)| *d).max().unwrap_or(0) + 1;
    let expr = Expr::Function {
        name: name.to_ascii_uppercase(),
        args: args.into_iter().map(|(e, _)| e).collect(),
    };
    Ok((input, checked(input, expr, depth)?))
}

fn parse_group<'a>(input: &'a str, nesting: usize) -> IResult<&'a str, Node> {
    let (input, _) = char('(')(input)?;
    let nesting = nest(input, nesting)?;
    let (input, (inner, depth)) = expression(input, nesting)?;
    let (input, _) = char(')')(input)?;
    Ok((input, checked(input, Expr::Grouped(Box::new(inner)), depth + 1)?))
}

fn parse_additive_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Sub, char('-')),
    ))(input)
}

fn parse_multiplicative_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Div, char('/')),
    ))(input)
}

/// Parse a primary expression (literals, references, function calls, parentheses)
fn parse_primary<'a>(input: &'a str, nesting: usize) -> IResult<&'a str, Node> {
    ws(alt((
        |i: &'a str| parse_group(i, nesting),
        map(parse_string, leaf),
        map(parse_number, leaf),
        map(value(Expr::InvalidRef, tag("#REF!")), leaf),
        map(parse_range, leaf),
        map(parse_cell_ref, |r| leaf(Expr::CellRef(r))),
        |i: &'a str| parse_function_call(i, nesting),
    )))(input)
}

/// Parse a unary expression (any run of prefix -)
fn parse_unary<'a>(input: &'a str, nesting: usize) -> IResult<&'a str, Node> {
    let (input, negations) = fold_many0(ws(char('-')), || 0usize, |n, _| n + 1)(input)?;
    let (input, (mut expr, depth)) = parse_primary(input, nesting)?;

    let depth = depth + negations;
    if depth > MAX_DEPTH {
        return Err(too_deep(input));
    }
    for _ in 0..negations {
        expr = Expr::neg(expr);
    }
    Ok((input, (expr, depth)))
}

/// Left-fold `operand (op operand)*`, stopping quietly where the next pair
/// does not parse
fn fold_binary<'a, O, P>(
    mut input: &'a str,
    (mut acc, mut depth): Node,
    mut op: O,
    mut operand: P,
) -> IResult<&'a str, Node>
where
    O: FnMut(&'a str) -> IResult<&'a str, BinaryOp>,
    P: FnMut(&'a str) -> IResult<&'a str, Node>,
{
    loop {
        let (rest, bin_op) = match op(input) {
            Ok(parsed) => parsed,
            Err(nom::Err::Error(_)) => return Ok((input, (acc, depth))),
            Err(e) => return Err(e),
        };
        let (rest, (rhs, rhs_depth)) = match operand(rest) {
            Ok(parsed) => parsed,
            Err(nom::Err::Error(_)) => return Ok((input, (acc, depth))),
            Err(e) => return Err(e),
        };

        depth = depth.max(rhs_depth) + 1;
        if depth > MAX_DEPTH {
            return Err(too_deep(rest));
        }
        acc = Expr::binary(acc, bin_op, rhs);
        input = rest;
    }
}

/// Parse multiplicative expressions (*, /)
fn parse_multiplicative<'a>(input: &'a str, nesting: usize) -> IResult<&'a str, Node> {
    let (input, init) = parse_unary(input, nesting)?;
    fold_binary(input, init, ws(parse_multiplicative_op), |i: &'a str| {
        parse_unary(i, nesting)
    })
}

/// Parse additive expressions (+, -)
fn parse_additive<'a>(input: &'a str, nesting: usize) -> IResult<&'a str, Node> {
    let (input, init) = parse_multiplicative(input, nesting)?;
    fold_binary(input, init, ws(parse_additive_op), |i: &'a str| {
        parse_multiplicative(i, nesting)
    })
}

fn expression<'a>(input: &'a str, nesting: usize) -> IResult<&'a str, Node> {
    ws(|i: &'a str| parse_additive(i, nesting))(input)
}

/// Parse a complete expression
pub fn parse_expression(input: &str) -> IResult<&str, Expr> {
    let (rest, (expr, _)) = expression(input, MAX_NESTING)?;
    Ok((rest, expr))
}

/// Parse a formula into an AST. A leading `=` is optional.
///
/// Formulas nested deeper than [`MAX_NESTING`] parentheses or calls, or whose
/// tree is taller than [`MAX_DEPTH`], are rejected as parse errors.
pub fn parse(formula: &str) -> Result<Expr, FormulaError> {
    let input = formula.strip_prefix('=').unwrap_or(formula);

    match parse_expression(input) {
        Ok(("", expr)) => Ok(expr),
        Ok((remaining, _)) => Err(FormulaError::Parse {
            message: format!("unexpected input: '{}'", remaining),
            position: input.len() - remaining.len(),
        }),
        Err(nom::Err::Failure(e)) if e.code == nom::error::ErrorKind::TooLarge => {
            Err(FormulaError::Parse {
                message: "formula nested too deeply".to_string(),
                position: input.len() - e.input.len(),
            })
        }
        Err(e) => Err(FormulaError::Parse {
            message: format!("{:?}", e),
            position: 0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(row: u32, col: u32) -> Reference {
        Reference::relative(row, col)
    }

    #[test]
    fn test_number() {
        assert_eq!(parse("123"), Ok(Expr::Number(123.0)));
        assert_eq!(parse("3.14"), Ok(Expr::Number(3.14)));
        assert_eq!(parse(".5"), Ok(Expr::Number(0.5)));
        assert_eq!(parse("1.5e-3"), Ok(Expr::Number(1.5e-3)));
        assert_eq!(parse("-5"), Ok(Expr::neg(Expr::Number(5.0))));
    }

    #[test]
    fn test_string() {
        assert_eq!(parse("\"hello\""), Ok(Expr::Text("hello".to_string())));
        assert_eq!(parse("\"\""), Ok(Expr::Text(String::new())));
        assert_eq!(
            parse("\"say \"\"hi\"\"\""),
            Ok(Expr::Text("say \"hi\"".to_string()))
        );
        assert!(parse("\"unterminated").is_err());
    }

    #[test]
    fn test_cell_reference() {
        assert_eq!(parse("A1"), Ok(Expr::cell_ref(0, 0)));
        assert_eq!(parse("aa10"), Ok(Expr::cell_ref(9, 26)));
        assert_eq!(
            parse("$A$1"),
            Ok(Expr::CellRef(Reference {
                row: 0,
                col: 0,
                abs_row: true,
                abs_col: true
            }))
        );
        assert_eq!(
            parse("A$1"),
            Ok(Expr::CellRef(Reference {
                row: 0,
                col: 0,
                abs_row: true,
                abs_col: false
            }))
        );
    }

    #[test]
    fn test_reference_out_of_grid_is_error() {
        assert!(parse("A0").is_err());
        assert!(parse("XFE1").is_err());
        assert!(parse("A1048577").is_err());
    }

    #[test]
    fn test_range() {
        assert_eq!(parse("A1:B2"), Ok(Expr::range(r(0, 0), r(1, 1))));
        assert_eq!(parse("A1 : B2"), Ok(Expr::range(r(0, 0), r(1, 1))));
    }

    #[test]
    fn test_precedence_and_associativity() {
        // 1 + 2 * 3 = 1 + (2 * 3)
        assert_eq!(
            parse("1 + 2 * 3"),
            Ok(Expr::binary(
                Expr::Number(1.0),
                BinaryOp::Add,
                Expr::binary(Expr::Number(2.0), BinaryOp::Mul, Expr::Number(3.0)),
            ))
        );
        // 8 - 2 - 1 = (8 - 2) - 1
        assert_eq!(
            parse("8-2-1"),
            Ok(Expr::binary(
                Expr::binary(Expr::Number(8.0), BinaryOp::Sub, Expr::Number(2.0)),
                BinaryOp::Sub,
                Expr::Number(1.0),
            ))
        );
    }

    #[test]
    fn test_parentheses() {
        let expr = parse("(1 + 2) * 3").unwrap();
        match expr {
            Expr::Binary { left, op, right } => {
                assert_eq!(op, BinaryOp::Mul);
                assert!(matches!(*left, Expr::Grouped(_)));
                assert_eq!(*right, Expr::Number(3.0));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_function_call() {
        assert_eq!(
            parse("sum(A1:A10)"),
            Ok(Expr::function("SUM", vec![Expr::range(r(0, 0), r(9, 0))]))
        );
        assert_eq!(
            parse("SUM(A1, MAX(B1:B10))"),
            Ok(Expr::function(
                "SUM",
                vec![
                    Expr::cell_ref(0, 0),
                    Expr::function("MAX", vec![Expr::range(r(0, 1), r(9, 1))]),
                ]
            ))
        );
        assert_eq!(parse("NOW()"), Ok(Expr::function("NOW", vec![])));
    }

    #[test]
    fn test_name_that_looks_like_a_reference() {
        assert_eq!(
            parse("LOG10(100)"),
            Ok(Expr::function("LOG10", vec![Expr::Number(100.0)]))
        );
    }

    #[test]
    fn test_with_leading_equals() {
        assert_eq!(parse("=123"), Ok(Expr::Number(123.0)));
        assert_eq!(parse("= A1 "), Ok(Expr::cell_ref(0, 0)));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(parse("="), Err(FormulaError::Parse { .. })));
        assert!(matches!(parse("=1+"), Err(FormulaError::Parse { .. })));
        assert!(matches!(parse("=(1"), Err(FormulaError::Parse { .. })));
        assert!(matches!(parse("=A1 B1"), Err(FormulaError::Parse { .. })));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("={}1{}", "(".repeat(n), ")".repeat(n));
        assert!(parse(&nested(MAX_NESTING)).is_ok());
        assert!(matches!(
            parse(&nested(MAX_NESTING + 1)),
            Err(FormulaError::Parse { .. })
        ));
        assert!(parse(&nested(10_000)).is_err());

        let calls = format!("={}1{}", "SUM(".repeat(10_000), ")".repeat(10_000));
        assert!(parse(&calls).is_err());
    }

    #[test]
    fn test_depth_limit() {
        assert_eq!(
            parse("=--3"),
            Ok(Expr::neg(Expr::neg(Expr::Number(3.0))))
        );
        assert!(parse(&format!("={}1", "-".repeat(5_000))).is_err());

        let chain = |n: usize| format!("={}", vec!["A1"; n].join("+"));
        assert!(parse(&chain(200)).is_ok());
        assert!(parse(&chain(MAX_DEPTH + 1)).is_err());
        assert!(parse(&chain(100_000)).is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for formula in ["SUM(A1:B2)+$C$3*2", "-(A1-B1)/4", "\"a\"\"b\"", "#REF!+1"] {
            let expr = parse(formula).unwrap();
            assert_eq!(expr.to_string(), formula);
        }
    }
}
