//! Contrato con la capacidad externa de aleatorización.
//!
//! El core nunca implementa la matemática de asignación: recibe un
//! `Randomizer` que, dado un `SchemeRequest`, construye un
//! `AssignmentScheme` capaz de realizar asignaciones y de reportar las
//! probabilidades por unidad. Un esquema ya construido es inmutable y puede
//! compartirse entre hilos; la aleatoriedad la aporta cada llamada.

use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;
use rand::RngCore;
use serde_json::Value;

use crate::errors::SchemeError;

/// Argumentos ya evaluados que se entregan a la capacidad.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemeRequest {
    /// Filas de la tabla; `None` cuando se intenta construir sin datos.
    pub n: Option<usize>,
    pub blocks: Option<Vec<Value>>,
    pub clusters: Option<Vec<Value>>,
    /// Resto de parámetros del esquema (`prob`, `m`, `conditions`, ...).
    pub params: IndexMap<String, Value>,
}

impl SchemeRequest {
    /// Separa `blocks`/`clusters` del resto de argumentos evaluados. Un
    /// escalar se trata como secuencia de longitud 1.
    pub fn from_args(n: Option<usize>, mut args: IndexMap<String, Value>) -> Self {
        let blocks = args.shift_remove("blocks").map(into_sequence);
        let clusters = args.shift_remove("clusters").map(into_sequence);
        Self { n,
               blocks,
               clusters,
               params: args }
    }
}

fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        scalar => vec![scalar],
    }
}

/// Esquema de asignación completo.
pub trait AssignmentScheme: Send + Sync + Debug {
    /// Número de unidades (filas) que asigna.
    fn n(&self) -> usize;

    /// Condiciones posibles, en orden (K = `conditions().len()`).
    fn conditions(&self) -> &[Value];

    /// Realiza un vector de asignación de longitud `n()`.
    fn realize(&self, rng: &mut dyn RngCore) -> Vec<Value>;

    /// Probabilidad, por unidad, de la condición efectivamente recibida.
    fn condition_probabilities(&self, assignment: &[Value]) -> Result<Vec<f64>, SchemeError>;

    /// Matriz N×K de probabilidades por unidad y condición.
    fn probability_matrix(&self) -> Vec<Vec<f64>>;

    /// Descripción JSON estable (entra en el hash del artifact).
    fn describe(&self) -> Value;
}

/// Capacidad de aleatorización.
pub trait Randomizer: Send + Sync + Debug {
    fn id(&self) -> &str;

    fn declare(&self, request: &SchemeRequest) -> Result<Arc<dyn AssignmentScheme>, SchemeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_splits_structural_arguments() {
        let mut args = IndexMap::new();
        args.insert("prob".to_string(), json!(0.5));
        args.insert("blocks".to_string(), json!(["a", "b"]));
        args.insert("clusters".to_string(), json!(7));
        let request = SchemeRequest::from_args(Some(2), args);
        assert_eq!(request.blocks, Some(vec![json!("a"), json!("b")]));
        assert_eq!(request.clusters, Some(vec![json!(7)]));
        assert_eq!(request.params.keys().collect::<Vec<_>>(), vec!["prob"]);
    }
}
