//! Handler por defecto de los steps de asignación.

use std::sync::Arc;

use log::debug;
use rand::RngCore;
use serde_json::Value;

use super::{cond_prob_column, probability_column, Handler, HandlerArgs};
use crate::constants::MATRIX_FLAG_PARAM;
use crate::errors::{RuntimeEvaluationError, SchemeError};
use crate::model::DataTable;
use crate::scheme::{AssignmentScheme, Randomizer, SchemeRequest};

/// Delega la construcción del esquema en un `Randomizer` y añade la columna
/// realizada y su probabilidad condicional.
#[derive(Debug, Clone)]
pub struct AssignmentHandler {
    randomizer: Arc<dyn Randomizer>,
}

impl AssignmentHandler {
    pub fn new(randomizer: Arc<dyn Randomizer>) -> Self {
        Self { randomizer }
    }

    /// Esquema del artifact (si lo hay) o uno nuevo construido con los
    /// argumentos evaluados y `N = filas`.
    fn scheme_for(&self, data: &DataTable, args: &HandlerArgs) -> Result<Arc<dyn AssignmentScheme>, RuntimeEvaluationError> {
        let rows = data.n_rows();
        let scheme = match args.artifact() {
            Some(artifact) => Arc::clone(artifact.scheme()),
            None => self.randomizer.declare(&SchemeRequest::from_args(Some(rows), args.scheme_params()))?,
        };
        if scheme.n() != rows {
            return Err(SchemeError::LengthMismatch { what: "data".to_string(),
                                                     expected: scheme.n(),
                                                     found: rows }.into());
        }
        Ok(scheme)
    }
}

impl Handler for AssignmentHandler {
    fn id(&self) -> &str {
        "assignment"
    }

    fn handle(&self,
              data: &DataTable,
              args: &HandlerArgs,
              target: &str,
              rng: &mut dyn RngCore)
              -> Result<DataTable, RuntimeEvaluationError> {
        let scheme = self.scheme_for(data, args)?;
        let mut out = data.clone();

        if args.flag(MATRIX_FLAG_PARAM)? {
            let matrix = scheme.probability_matrix();
            for k in 0..scheme.conditions().len() {
                let column: Vec<Value> = matrix.iter().map(|row| Value::from(row.get(k).copied().unwrap_or(0.0))).collect();
                out = out.with_column(probability_column(target, k + 1), column)?;
            }
        }

        let assignment = scheme.realize(rng);
        let probabilities = scheme.condition_probabilities(&assignment)?;
        debug!("assignment '{}' realizado sobre {} filas", target, assignment.len());
        out = out.with_column(target, assignment)?;
        out = out.with_column(cond_prob_column(target), probabilities.into_iter().map(Value::from).collect())?;
        Ok(out)
    }

    fn randomizer(&self) -> Option<&Arc<dyn Randomizer>> {
        Some(&self.randomizer)
    }

    fn produced_columns(&self, target: &str) -> Vec<String> {
        vec![target.to_string(), cond_prob_column(target)]
    }
}
