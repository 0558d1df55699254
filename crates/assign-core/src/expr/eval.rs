//! Evaluación de expresiones diferidas.
//!
//! Los valores son `serde_json::Value`; un vector es `Value::Array`. La
//! aritmética es vectorizada elemento a elemento con broadcasting de
//! escalares. Evaluar no tiene efectos secundarios y es repetible.

use serde_json::Value;

use super::ast::{BinaryOp, Expr};
use super::{Env, EvalContext};
use crate::constants::ROW_COUNT_SYMBOL;
use crate::errors::RuntimeEvaluationError;

type EvalResult = Result<Value, RuntimeEvaluationError>;

/// Longitud máxima de un vector generado por `rep`/`seq`.
pub const MAX_GENERATED_LEN: usize = 1_000_000;

/// Evalúa `expr` en el entorno de definición `env`, con la tabla de
/// `context` (si existe) por delante en la búsqueda de nombres.
pub fn evaluate(expr: &Expr, env: &Env, context: &EvalContext<'_>) -> EvalResult {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Symbol(name) => resolve_symbol(name, env, context),
        Expr::Vector(items) => {
            let values = items.iter().map(|item| evaluate(item, env, context)).collect::<Result<Vec<_>, _>>()?;
            Ok(concat(values))
        }
        Expr::Neg(operand) => {
            let value = evaluate(operand, env, context)?;
            arithmetic(BinaryOp::Mul, &Value::from(-1), &value)
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, env, context)?;
            let right = evaluate(right, env, context)?;
            arithmetic(*op, &left, &right)
        }
        Expr::Call { function, args } => {
            let values = args.iter().map(|arg| evaluate(arg, env, context)).collect::<Result<Vec<_>, _>>()?;
            call_builtin(function, values)
        }
    }
}

fn resolve_symbol(name: &str, env: &Env, context: &EvalContext<'_>) -> EvalResult {
    if let Some(table) = context.table() {
        if let Some(column) = table.column(name) {
            return Ok(Value::Array(column.to_vec()));
        }
        if name == ROW_COUNT_SYMBOL {
            return Ok(Value::from(table.n_rows()));
        }
    }
    env.get(name).cloned().ok_or_else(|| RuntimeEvaluationError::UnboundName(name.to_string()))
}

fn concat(values: Vec<Value>) -> Value {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Array(items) => out.extend(items),
            scalar => out.push(scalar),
        }
    }
    Value::Array(out)
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    let operation = op.symbol();
    let lhs = numbers(left, operation)?;
    let rhs = numbers(right, operation)?;
    let len = match (lhs.len(), rhs.len()) {
        (l, r) if l == r => l,
        (1, r) => r,
        (l, 1) => l,
        (l, r) => {
            return Err(RuntimeEvaluationError::LengthMismatch { operation: operation.to_string(),
                                                                 left: l,
                                                                 right: r })
        }
    };
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let a = lhs[if lhs.len() == 1 { 0 } else { i }];
        let b = rhs[if rhs.len() == 1 { 0 } else { i }];
        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        };
        out.push(number_value(result, operation)?);
    }
    if left.is_array() || right.is_array() {
        Ok(Value::Array(out))
    } else {
        Ok(out.pop().unwrap_or(Value::Null))
    }
}

fn numbers(value: &Value, function: &str) -> Result<Vec<f64>, RuntimeEvaluationError> {
    let as_number = |v: &Value| match v {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    let invalid = |v: &Value| RuntimeEvaluationError::InvalidArgument { function: function.to_string(),
                                                                        message: format!("non-numeric value {v}") };
    match value {
        Value::Array(items) => items.iter().map(|v| as_number(v).ok_or_else(|| invalid(v))).collect(),
        scalar => as_number(scalar).map(|n| vec![n]).ok_or_else(|| invalid(scalar)),
    }
}

/// Enteros exactos se mantienen como enteros JSON (`6 / 2` → `3`).
fn number_value(x: f64, function: &str) -> EvalResult {
    if !x.is_finite() {
        return Err(RuntimeEvaluationError::InvalidArgument { function: function.to_string(),
                                                             message: "non-finite result".to_string() });
    }
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        Ok(Value::from(x as i64))
    } else {
        Ok(Value::from(x))
    }
}

fn call_builtin(function: &str, args: Vec<Value>) -> EvalResult {
    match function {
        "c" => Ok(concat(args)),
        "length" => {
            let [x] = expect_args::<1>(function, args)?;
            Ok(Value::from(match x {
                Value::Array(items) => items.len(),
                _ => 1,
            }))
        }
        "round" => {
            let [x] = expect_args::<1>(function, args)?;
            let rounded = numbers(&x, function)?.into_iter()
                                                .map(|n| number_value(n.round(), function))
                                                .collect::<Result<Vec<_>, _>>()?;
            if x.is_array() {
                Ok(Value::Array(rounded))
            } else {
                Ok(rounded.into_iter().next().unwrap_or(Value::Null))
            }
        }
        "rep" => {
            let [x, times] = expect_args::<2>(function, args)?;
            let times = count(&times, function)?;
            let items = match x {
                Value::Array(items) => items,
                scalar => vec![scalar],
            };
            let total = items.len().checked_mul(times).filter(|n| *n <= MAX_GENERATED_LEN).ok_or_else(|| too_long(function))?;
            let mut out = Vec::with_capacity(total);
            for _ in 0..times {
                out.extend(items.iter().cloned());
            }
            Ok(Value::Array(out))
        }
        "seq" => {
            let [from, to] = expect_args::<2>(function, args)?;
            let from = integer(&from, function)?;
            let to = integer(&to, function)?;
            if from.abs_diff(to) >= MAX_GENERATED_LEN as u64 {
                return Err(too_long(function));
            }
            let values: Vec<Value> = if from <= to {
                (from..=to).map(Value::from).collect()
            } else {
                (to..=from).rev().map(Value::from).collect()
            };
            Ok(Value::Array(values))
        }
        other => Err(RuntimeEvaluationError::UnknownFunction(other.to_string())),
    }
}

fn expect_args<const K: usize>(function: &str, args: Vec<Value>) -> Result<[Value; K], RuntimeEvaluationError> {
    let found = args.len();
    args.try_into().map_err(|_| RuntimeEvaluationError::InvalidArgument { function: function.to_string(),
                                                                        message: format!("expected {K} arguments, found {found}") })
}

fn too_long(function: &str) -> RuntimeEvaluationError {
    RuntimeEvaluationError::InvalidArgument { function: function.to_string(),
                                              message: format!("result would exceed {MAX_GENERATED_LEN} elements") }
}

fn integer(value: &Value, function: &str) -> Result<i64, RuntimeEvaluationError> {
    let n = numbers(value, function)?;
    match n.as_slice() {
        [x] if x.fract() == 0.0 && x.abs() < 9.0e15 => Ok(*x as i64),
        _ => Err(RuntimeEvaluationError::InvalidArgument { function: function.to_string(),
                                                          message: format!("expected an integer, found {value}") }),
    }
}

fn count(value: &Value, function: &str) -> Result<usize, RuntimeEvaluationError> {
    let n = numbers(value, function)?;
    match n.as_slice() {
        [x] if *x >= 0.0 && x.fract() == 0.0 => Ok(*x as usize),
        _ => Err(RuntimeEvaluationError::InvalidArgument { function: function.to_string(),
                                                          message: format!("expected a non-negative integer, found {value}") }),
    }
}
