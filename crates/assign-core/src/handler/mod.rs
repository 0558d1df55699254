//! Contrato para handlers de steps.
//!
//! Un `Handler` recibe la tabla, los argumentos ya evaluados para la
//! variable objetivo en curso y un generador aleatorio, y devuelve una tabla
//! nueva. El runtime verifica después que el handler respetó el contrato:
//! mismo número de filas, columnas de entrada intactas y columnas
//! producidas presentes.

pub mod assignment;

use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;
use rand::RngCore;
use serde_json::Value;

use crate::constants::{COND_PROB_SUFFIX, HANDLER_PARAMS};
use crate::declaration::DeclarationArtifact;
use crate::errors::RuntimeEvaluationError;
use crate::model::DataTable;
use crate::scheme::Randomizer;

pub use assignment::AssignmentHandler;

/// Argumentos evaluados que recibe un handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerArgs {
    values: IndexMap<String, Value>,
    artifact: Option<Arc<DeclarationArtifact>>,
}

impl HandlerArgs {
    pub fn new(values: IndexMap<String, Value>, artifact: Option<Arc<DeclarationArtifact>>) -> Self {
        Self { values, artifact }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub fn artifact(&self) -> Option<&Arc<DeclarationArtifact>> {
        self.artifact.as_ref()
    }

    /// Flag booleano; ausente equivale a `false`. Acepta `true`/`false` y
    /// números (distinto de cero = verdadero).
    pub fn flag(&self, name: &str) -> Result<bool, RuntimeEvaluationError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Number(n)) => Ok(n.as_f64().is_some_and(|x| x != 0.0)),
            Some(other) => Err(RuntimeEvaluationError::Argument { name: name.to_string(),
                                                                  message: format!("expected a logical flag, got {other}") }),
        }
    }

    /// Argumentos que van al esquema (sin los que consume el handler).
    pub fn scheme_params(&self) -> IndexMap<String, Value> {
        self.values
            .iter()
            .filter(|(name, _)| !HANDLER_PARAMS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Handler de un tipo de step.
pub trait Handler: Send + Sync + Debug {
    /// Identificador estable (entra en el fingerprint).
    fn id(&self) -> &str;

    fn handle(&self,
              data: &DataTable,
              args: &HandlerArgs,
              target: &str,
              rng: &mut dyn RngCore)
              -> Result<DataTable, RuntimeEvaluationError>;

    /// Capacidad de aleatorización usada para el factoring, si la hay.
    fn randomizer(&self) -> Option<&Arc<dyn Randomizer>> {
        None
    }

    /// Columnas que el handler garantiza producir para `target`.
    fn produced_columns(&self, target: &str) -> Vec<String> {
        vec![target.to_string()]
    }
}

/// Nombre de la columna de probabilidad condicional: `Z` -> `Z_cond_prob`,
/// `treat.arm` -> `treat_arm_cond_prob`.
pub fn cond_prob_column(target: &str) -> String {
    format!("{}{COND_PROB_SUFFIX}", target.replace('.', "_"))
}

/// Columna de probabilidad para la condición `k` (1-based): `Z.1`, `Z.2`, ...
pub fn probability_column(target: &str, k: usize) -> String {
    format!("{target}.{k}")
}

/// `true` si `column` es una columna de la matriz de probabilidades de `target`.
pub fn is_probability_column(column: &str, target: &str) -> bool {
    column.strip_prefix(target)
          .and_then(|rest| rest.strip_prefix('.'))
          .is_some_and(|k| !k.is_empty() && k.chars().all(|c| c.is_ascii_digit()))
}
