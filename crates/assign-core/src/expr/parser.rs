//! Parser de expresiones diferidas (nom).
//!
//! Gramática:
//!
//! ```text
//! expression := term (("+" | "-") term)*
//! term       := unary (("*" | "/") unary)*
//! unary      := "-" unary | primary
//! primary    := number | string | "[" args "]" | "(" expression ")"
//!             | identifier ["(" args ")"]
//! args       := (expression ("," expression)*)?
//! ```
//!
//! Los identificadores admiten `.` después del primer carácter (`x.1`).
//! `true`, `false` y `null` son literales.

use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, multispace0, one_of, satisfy},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::{many0, separated_list0},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded},
    IResult,
};
use serde_json::Value;

use super::ast::{BinaryOp, Expr};
use crate::errors::ParseError;

/// Parsea el código fuente completo de un argumento.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    match all_consuming(ws(expression))(source) {
        Ok((_, expr)) => Ok(expr),
        Err(err) => {
            let message = match err {
                nom::Err::Error(e) | nom::Err::Failure(e) if e.input.is_empty() => "unexpected end of input".to_string(),
                nom::Err::Error(e) | nom::Err::Failure(e) => format!("unexpected input at `{}`", e.input),
                nom::Err::Incomplete(_) => "incomplete input".to_string(),
            };
            Err(ParseError { input: source.to_string(),
                             message })
        }
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
    where F: FnMut(&'a str) -> IResult<&'a str, O>
{
    delimited(multispace0, inner, multispace0)
}

fn expression(input: &str) -> IResult<&str, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(ws(one_of("+-")), term))(input)?;
    Ok((input, rest.into_iter().fold(first, |left, (op, right)| binary(op, left, right))))
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(ws(one_of("*/")), unary))(input)?;
    Ok((input, rest.into_iter().fold(first, |left, (op, right)| binary(op, left, right))))
}

fn binary(op: char, left: Expr, right: Expr) -> Expr {
    let op = match op {
        '+' => BinaryOp::Add,
        '-' => BinaryOp::Sub,
        '*' => BinaryOp::Mul,
        _ => BinaryOp::Div,
    };
    Expr::Binary { op,
                   left: Box::new(left),
                   right: Box::new(right) }
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((map(preceded(ws(char('-')), unary), negate), primary))(input)
}

// `-0.5` queda como literal para que su forma siga siendo `Literal`.
fn negate(operand: Expr) -> Expr {
    match operand {
        Expr::Literal(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Expr::Literal(Value::from(-i))
            } else {
                Expr::Literal(n.as_f64().map(|f| Value::from(-f)).unwrap_or(Value::Null))
            }
        }
        other => Expr::Neg(Box::new(other)),
    }
}

fn primary(input: &str) -> IResult<&str, Expr> {
    ws(alt((number, string_literal, vector, parenthesized, symbol_or_call)))(input)
}

fn number(input: &str) -> IResult<&str, Expr> {
    map_res(recognize_float, |text: &str| {
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Expr::Literal(Value::from(int)));
        }
        text.parse::<f64>().map(|f| Expr::Literal(Value::from(f)))
    })(input)
}

fn string_literal(input: &str) -> IResult<&str, Expr> {
    map(alt((delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
             delimited(char('\''), take_while(|c: char| c != '\''), char('\'')))),
        |s: &str| Expr::Literal(Value::String(s.to_string())))(input)
}

fn vector(input: &str) -> IResult<&str, Expr> {
    map(delimited(char('['), arguments, ws(char(']'))), Expr::Vector)(input)
}

fn parenthesized(input: &str) -> IResult<&str, Expr> {
    delimited(char('('), ws(expression), char(')'))(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<Expr>> {
    separated_list0(char(','), ws(expression))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
                   take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.')))(input)
}

fn symbol_or_call(input: &str) -> IResult<&str, Expr> {
    let (input, name) = identifier(input)?;
    let (input, args) = opt(preceded(multispace0, delimited(char('('), arguments, ws(char(')')))))(input)?;
    let expr = match (name, args) {
        (_, Some(args)) => Expr::Call { function: name.to_string(),
                                        args },
        ("true", None) => Expr::Literal(Value::Bool(true)),
        ("false", None) => Expr::Literal(Value::Bool(false)),
        ("null", None) => Expr::Literal(Value::Null),
        (_, None) => Expr::Symbol(name.to_string()),
    };
    Ok((input, expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sym(name: &str) -> Expr {
        Expr::Symbol(name.to_string())
    }

    #[test]
    fn parses_bare_reference_and_quoted_string() {
        assert_eq!(parse_expression("block").unwrap(), sym("block"));
        assert_eq!(parse_expression("  \"block\" ").unwrap(), Expr::Literal(json!("block")));
        assert_eq!(parse_expression("'block'").unwrap(), Expr::Literal(json!("block")));
        assert_eq!(parse_expression("x.1").unwrap(), sym("x.1"));
    }

    #[test]
    fn parses_numbers_and_keywords() {
        assert_eq!(parse_expression("3").unwrap(), Expr::Literal(json!(3)));
        assert_eq!(parse_expression("0.25").unwrap(), Expr::Literal(json!(0.25)));
        assert_eq!(parse_expression("-2").unwrap(), Expr::Literal(json!(-2)));
        assert_eq!(parse_expression("true").unwrap(), Expr::Literal(json!(true)));
    }

    #[test]
    fn respects_precedence() {
        let parsed = parse_expression("N - 2 * m").unwrap();
        let expected = Expr::Binary { op: BinaryOp::Sub,
                                      left: Box::new(sym("N")),
                                      right: Box::new(Expr::Binary { op: BinaryOp::Mul,
                                                                     left: Box::new(Expr::Literal(json!(2))),
                                                                     right: Box::new(sym("m")) }) };
        assert_eq!(parsed, expected);
    }

    #[test]
    fn parses_vectors_and_calls() {
        assert_eq!(parse_expression("[\"Z1\", Z2]").unwrap(),
                   Expr::Vector(vec![Expr::Literal(json!("Z1")), sym("Z2")]));
        assert_eq!(parse_expression("rep(c(1, 2), N / 2)").unwrap(),
                   Expr::Call { function: "rep".into(),
                                args: vec![Expr::Call { function: "c".into(),
                                                        args: vec![Expr::Literal(json!(1)), Expr::Literal(json!(2))] },
                                           Expr::Binary { op: BinaryOp::Div,
                                                          left: Box::new(sym("N")),
                                                          right: Box::new(Expr::Literal(json!(2))) }] });
        assert_eq!(parse_expression("f()").unwrap(), Expr::Call { function: "f".into(), args: vec![] });
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse_expression("block )").unwrap_err();
        assert_eq!(err.input, "block )");
        assert!(parse_expression("").is_err());
        assert!(parse_expression("[1, 2").is_err());
    }
}
