//! Runtime de steps: aplicación de una declaración validada a una tabla.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use rand::RngCore;
use serde_json::Value;

use crate::constants::TARGET_PARAM;
use crate::declaration::{scoped_name, split_scope, CapturedArg, Declaration};
use crate::errors::{DeclareTimeError, RuntimeEvaluationError};
use crate::expr::EvalContext;
use crate::handler::{is_probability_column, Handler, HandlerArgs};
use crate::model::DataTable;

/// Composición en pipelines: un step sólo expone `data -> data'`.
pub trait StepFn: Send + Sync {
    fn call(&self, data: &DataTable) -> Result<DataTable, RuntimeEvaluationError>;
}

/// Step ligado a una declaración validada. Clonar es barato y el mismo
/// step puede aplicarse en paralelo desde varios hilos.
#[derive(Debug, Clone)]
pub struct Step {
    declaration: Arc<Declaration>,
}

/// Liga una declaración validada. Ligar una declaración sin validar es un
/// error de declaración.
pub fn bind(declaration: Declaration) -> Result<Step, DeclareTimeError> {
    if !declaration.is_validated() {
        return Err(DeclareTimeError::new("cannot bind a declaration that has not been validated", declaration.describe()));
    }
    debug!("bind '{}' ({})", declaration.label(), declaration.fingerprint());
    Ok(Step { declaration: Arc::new(declaration) })
}

impl Step {
    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn label(&self) -> &str {
        self.declaration.label()
    }

    /// Aplica el step con el generador del hilo.
    pub fn apply(&self, data: &DataTable) -> Result<DataTable, RuntimeEvaluationError> {
        self.apply_with_rng(data, &mut rand::thread_rng())
    }

    /// Aplica el step con una fuente aleatoria explícita (reproducible con
    /// una semilla fija). La tabla de entrada no se modifica.
    pub fn apply_with_rng(&self, data: &DataTable, rng: &mut dyn RngCore) -> Result<DataTable, RuntimeEvaluationError> {
        let declaration = &self.declaration;
        let handler = declaration.handler();
        let artifact = declaration.artifact().cloned();
        let mut table = data.clone();

        // Cada variable ve las columnas producidas por las anteriores.
        for target in declaration.target_variables() {
            let values = self.evaluate_for(target, &table)?;
            let args = HandlerArgs::new(values, artifact.clone());
            let out = handler.handle(&table, &args, target, rng)?;
            check_contract(handler.as_ref(), &table, &out, target)?;
            table = out;
        }

        debug!("'{}' aplicado: {} filas, {} -> {} columnas",
               declaration.label(),
               data.n_rows(),
               data.n_cols(),
               table.n_cols());
        Ok(table)
    }

    /// Evalúa los argumentos diferidos para `target` sobre `table`. Un
    /// argumento `name@target` sustituye al compartido `name`; los que
    /// apuntan a otra variable se ignoran.
    fn evaluate_for(&self, target: &str, table: &DataTable) -> Result<IndexMap<String, Value>, RuntimeEvaluationError> {
        let args = self.declaration.args();
        let context = EvalContext::over(table);
        let mut values = IndexMap::with_capacity(args.len());

        for (key, arg) in args {
            let CapturedArg::Deferred(expr) = arg else { continue };
            let (name, scope) = split_scope(key);
            match scope {
                Some(scope) if scope != target => continue,
                None if args.contains_key(&scoped_name(name, target)) => continue,
                _ => {}
            }
            if name == TARGET_PARAM {
                continue;
            }
            values.insert(name.to_string(), expr.evaluate(&context)?);
        }
        values.insert(TARGET_PARAM.to_string(), Value::String(target.to_string()));
        Ok(values)
    }
}

impl StepFn for Step {
    fn call(&self, data: &DataTable) -> Result<DataTable, RuntimeEvaluationError> {
        self.apply(data)
    }
}

/// El handler debe conservar filas y columnas de entrada y producir sus
/// columnas. Sólo puede reemplazar sus propias columnas de salida.
fn check_contract(handler: &dyn Handler, input: &DataTable, output: &DataTable, target: &str) -> Result<(), RuntimeEvaluationError> {
    let violation = |message: String| RuntimeEvaluationError::HandlerContract { handler: handler.id().to_string(),
                                                                                 message };
    if output.n_rows() != input.n_rows() {
        return Err(violation(format!("returned {} rows, expected {}", output.n_rows(), input.n_rows())));
    }

    let produced = handler.produced_columns(target);
    if let Some(missing) = produced.iter().find(|column| !output.contains(column)) {
        return Err(violation(format!("did not produce column '{missing}'")));
    }

    for (name, column) in input.columns() {
        let own = produced.iter().any(|p| p == name) || is_probability_column(name, target);
        match output.column(name) {
            None => return Err(violation(format!("dropped input column '{name}'"))),
            Some(out) if !own && !Arc::ptr_eq(out, column) && out != column => {
                return Err(violation(format!("modified input column '{name}'")))
            }
            Some(_) => {}
        }
    }
    Ok(())
}
