//! Lectura de parámetros evaluados (`serde_json::Value`) con errores de
//! esquema.

use assign_core::SchemeError;
use serde_json::Value;

fn invalid(name: &str, message: impl Into<String>) -> SchemeError {
    SchemeError::InvalidParameter { name: name.to_string(),
                                    message: message.into() }
}

/// Un vector de longitud 1 se acepta donde se espera un escalar.
fn scalar<'a>(name: &str, value: &'a Value) -> Result<&'a Value, SchemeError> {
    match value {
        Value::Array(items) if items.len() == 1 => Ok(&items[0]),
        Value::Array(_) => Err(invalid(name, "expected a single value")),
        other => Ok(other),
    }
}

pub fn as_f64(name: &str, value: &Value) -> Result<f64, SchemeError> {
    scalar(name, value)?.as_f64().ok_or_else(|| invalid(name, format!("expected a number, got {value}")))
}

pub fn as_probability(name: &str, value: &Value) -> Result<f64, SchemeError> {
    let p = as_f64(name, value)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(invalid(name, format!("{p} is not a probability")));
    }
    Ok(p)
}

pub fn as_count(name: &str, value: &Value) -> Result<usize, SchemeError> {
    let x = as_f64(name, value)?;
    if x < 0.0 || x.fract() != 0.0 {
        return Err(invalid(name, format!("expected a non-negative integer, got {x}")));
    }
    Ok(x as usize)
}

pub fn as_flag(name: &str, value: &Value) -> Result<bool, SchemeError> {
    match scalar(name, value)? {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|x| x != 0.0)),
        other => Err(invalid(name, format!("expected a logical value, got {other}"))),
    }
}

pub fn as_sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

pub fn as_probabilities(name: &str, value: &Value) -> Result<Vec<f64>, SchemeError> {
    as_sequence(value).iter().map(|v| as_probability(name, v)).collect()
}

/// Clave hashable de una celda (los `Value` no implementan `Hash`).
pub fn key(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_accept_singleton_vectors() {
        assert_eq!(as_f64("prob", &json!([0.3])).unwrap(), 0.3);
        assert!(as_f64("prob", &json!([0.3, 0.4])).is_err());
        assert_eq!(as_count("m", &json!(3.0)).unwrap(), 3);
        assert!(as_count("m", &json!(2.5)).is_err());
        assert!(as_probability("prob", &json!(1.5)).is_err());
        assert!(as_flag("simple", &json!(true)).unwrap());
        assert!(as_flag("simple", &json!("yes")).is_err());
    }
}
