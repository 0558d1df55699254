use assign_core::{DeclareTimeError, RuntimeEvaluationError, TableError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error al declarar el step: {0}")]
    Declare(#[from] DeclareTimeError),
    #[error("Error al aplicar el step: {0}")]
    Runtime(#[from] RuntimeEvaluationError),
    #[error("Error de tabla: {0}")]
    Table(#[from] TableError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_variant_format() {
        let err = AppError::Config("ASSIGNFLOW_ROWS inválido".into());
        assert_eq!(err.to_string(), "Error de configuración: ASSIGNFLOW_ROWS inválido");
    }

    #[test]
    fn test_declare_variant_from() {
        let err: AppError = DeclareTimeError::new("falta algo", json!({})).into();
        assert_eq!(err.to_string(), "Error al declarar el step: declare-time error: falta algo");
    }

    #[test]
    fn test_table_variant_from() {
        let err: AppError = TableError::DuplicateColumn("unit".into()).into();
        assert_eq!(err.to_string(), "Error de tabla: duplicate column 'unit'");
    }

    #[test]
    fn test_runtime_variant_from() {
        let err: AppError = RuntimeEvaluationError::UnboundName("site".into()).into();
        assert_eq!(err.to_string(), "Error al aplicar el step: object 'site' not found");
    }
}
