//! Errores del core.
//!
//! Dos familias, según el momento en que se detectan:
//! - `DeclareTimeError`: violaciones estructurales detectables sin datos.
//!   Abortan la construcción de la declaración.
//! - `RuntimeEvaluationError`: fallos al aplicar un step a una tabla concreta.
//!   Abortan sólo esa aplicación; la declaración sigue siendo válida.

use serde_json::Value;
use thiserror::Error;

/// Error en tiempo de declaración. Lleva la descripción JSON de la
/// declaración intentada (ver `Declaration::describe`).
#[derive(Debug, Error, Clone, PartialEq)]
#[error("declare-time error: {message}")]
pub struct DeclareTimeError {
    pub message: String,
    pub attempted: Value,
}

impl DeclareTimeError {
    pub fn new(message: impl Into<String>, attempted: Value) -> Self {
        Self { message: message.into(),
               attempted }
    }
}

/// Error de sintaxis en el código fuente de un argumento diferido.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot parse `{input}`: {message}")]
pub struct ParseError {
    pub input: String,
    pub message: String,
}

/// Errores de construcción/modificación de tablas.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("column '{column}' has {found} rows, expected {expected}")]
    ColumnLength { column: String, expected: usize, found: usize },
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// Rechazo del esquema por parte de la capacidad de aleatorización.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemeError {
    #[error("N could not be determined: supply N, blocks or clusters")]
    MissingN,
    #[error("{what} has length {found}, expected {expected}")]
    LengthMismatch { what: String, expected: usize, found: usize },
    #[error("unknown scheme argument '{0}'")]
    UnknownParameter(String),
    #[error("invalid value for '{name}': {message}")]
    InvalidParameter { name: String, message: String },
    #[error("value {0} is not one of the declared conditions")]
    UnknownCondition(String),
}

/// Error en tiempo de aplicación de un step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeEvaluationError {
    #[error("object '{0}' not found")]
    UnboundName(String),
    #[error("could not find function '{0}'")]
    UnknownFunction(String),
    #[error("invalid argument to {function}: {message}")]
    InvalidArgument { function: String, message: String },
    #[error("length mismatch in {operation}: {left} vs {right}")]
    LengthMismatch { operation: String, left: usize, right: usize },
    #[error("argument '{name}': {message}")]
    Argument { name: String, message: String },
    #[error("scheme rejected: {0}")]
    Scheme(#[from] SchemeError),
    #[error("handler '{handler}' violated its contract: {message}")]
    HandlerContract { handler: String, message: String },
    #[error("table: {0}")]
    Table(#[from] TableError),
}

/// Error agregado para callers que no distinguen la fase.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
    #[error(transparent)]
    Declare(#[from] DeclareTimeError),
    #[error(transparent)]
    Runtime(#[from] RuntimeEvaluationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declare_time_error_formats_message() {
        let err = DeclareTimeError::new("Must provide the bare (unquoted) block variable name to blocks.", json!({"label": "assignment"}));
        assert_eq!(err.to_string(), "declare-time error: Must provide the bare (unquoted) block variable name to blocks.");
        assert_eq!(err.attempted["label"], json!("assignment"));
    }

    #[test]
    fn scheme_error_converts_into_runtime_error() {
        let err: RuntimeEvaluationError = SchemeError::MissingN.into();
        assert!(matches!(err, RuntimeEvaluationError::Scheme(SchemeError::MissingN)));
        assert!(err.to_string().starts_with("scheme rejected"));
    }

    #[test]
    fn step_error_is_transparent() {
        let err: StepError = RuntimeEvaluationError::UnboundName("block".into()).into();
        assert_eq!(err.to_string(), "object 'block' not found");
    }
}
