//! Dobles de prueba compartidos por los tests unitarios del core.

use std::sync::Arc;

use rand::RngCore;
use serde_json::{json, Value};

use crate::errors::{RuntimeEvaluationError, SchemeError};
use crate::handler::{Handler, HandlerArgs};
use crate::model::DataTable;
use crate::scheme::{AssignmentScheme, Randomizer, SchemeRequest};

/// Tabla con una columna `x = 0..n`.
pub fn table(n: usize) -> DataTable {
    DataTable::from_columns([("x", (0..n).map(|i| json!(i)).collect::<Vec<_>>())]).unwrap()
}

/// Handler que escribe `target = x + offset` (offset escalar o vector).
#[derive(Debug)]
pub struct OffsetHandler;

pub fn recording_handler() -> Arc<dyn Handler> {
    Arc::new(OffsetHandler)
}

impl Handler for OffsetHandler {
    fn id(&self) -> &str {
        "offset"
    }

    fn handle(&self, data: &DataTable, args: &HandlerArgs, target: &str, _rng: &mut dyn RngCore) -> Result<DataTable, RuntimeEvaluationError> {
        let x = data.column("x").ok_or_else(|| RuntimeEvaluationError::UnboundName("x".into()))?;
        let offset = |i: usize| -> i64 {
            match args.get("offset") {
                Some(Value::Array(items)) => items.get(i).and_then(Value::as_i64).unwrap_or(0),
                Some(v) => v.as_i64().unwrap_or(0),
                None => 0,
            }
        };
        let column = x.iter().enumerate().map(|(i, v)| json!(v.as_i64().unwrap_or(0) + offset(i))).collect();
        Ok(data.with_column(target, column)?)
    }
}

/// Capacidad que sólo acepta esquemas binarios de tamaño fijo.
#[derive(Debug)]
pub struct FixedRandomizer {
    n: usize,
}

impl FixedRandomizer {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl Randomizer for FixedRandomizer {
    fn id(&self) -> &str {
        "fixed"
    }

    fn declare(&self, request: &SchemeRequest) -> Result<Arc<dyn AssignmentScheme>, SchemeError> {
        let explicit = request.params.get("N").and_then(Value::as_u64).map(|n| n as usize);
        let n = request.n.or(explicit).ok_or(SchemeError::MissingN)?;
        for name in request.params.keys() {
            if name != "N" && name != "prob" {
                return Err(SchemeError::UnknownParameter(name.clone()));
            }
        }
        if n != self.n {
            return Err(SchemeError::LengthMismatch { what: "N".into(),
                                                     expected: self.n,
                                                     found: n });
        }
        Ok(Arc::new(HalfScheme { n, conditions: vec![json!(0), json!(1)] }))
    }
}

#[derive(Debug)]
pub struct HalfScheme {
    n: usize,
    conditions: Vec<Value>,
}

impl AssignmentScheme for HalfScheme {
    fn n(&self) -> usize {
        self.n
    }

    fn conditions(&self) -> &[Value] {
        &self.conditions
    }

    fn realize(&self, rng: &mut dyn RngCore) -> Vec<Value> {
        (0..self.n).map(|_| json!(rng.next_u32() % 2)).collect()
    }

    fn condition_probabilities(&self, assignment: &[Value]) -> Result<Vec<f64>, SchemeError> {
        Ok(vec![0.5; assignment.len()])
    }

    fn probability_matrix(&self) -> Vec<Vec<f64>> {
        vec![vec![0.5, 0.5]; self.n]
    }

    fn describe(&self) -> Value {
        json!({ "kind": "half", "n": self.n })
    }
}
