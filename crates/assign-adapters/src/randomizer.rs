//! Capacidad de aleatorización por defecto.

use std::sync::Arc;

use assign_core::{AssignmentScheme, Randomizer, SchemeError, SchemeRequest};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::params::{as_count, as_f64, as_flag, as_probabilities, as_probability, as_sequence, key};
use crate::scheme::StratifiedScheme;

/// Argumentos de esquema reconocidos.
pub const SCHEME_PARAMS: &[&str] = &["conditions", "num_arms", "prob", "prob_each", "m", "simple", "N"];

/// Tolerancia para `Σ p_k = 1`.
const SUM_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRandomizer;

impl StandardRandomizer {
    pub fn new() -> Self {
        Self
    }
}

fn invalid(name: &str, message: impl Into<String>) -> SchemeError {
    SchemeError::InvalidParameter { name: name.to_string(),
                                    message: message.into() }
}

impl Randomizer for StandardRandomizer {
    fn id(&self) -> &str {
        "standard"
    }

    fn declare(&self, request: &SchemeRequest) -> Result<Arc<dyn AssignmentScheme>, SchemeError> {
        let params = &request.params;
        if let Some(unknown) = params.keys().find(|name| !SCHEME_PARAMS.contains(&name.as_str())) {
            return Err(SchemeError::UnknownParameter(unknown.clone()));
        }

        let n = resolve_n(request)?;
        for (what, values) in [("blocks", &request.blocks), ("clusters", &request.clusters)] {
            if let Some(values) = values {
                if values.len() != n {
                    return Err(SchemeError::LengthMismatch { what: what.to_string(),
                                                             expected: n,
                                                             found: values.len() });
                }
            }
        }

        let conditions = resolve_conditions(params)?;
        let (unit_of_row, strata) = units_and_strata(n, request.blocks.as_deref(), request.clusters.as_deref())?;
        let n_units = unit_of_row.iter().max().map_or(0, |u| u + 1);
        let probabilities = resolve_probabilities(params, conditions.len(), n_units, request.blocks.is_some())?;
        let simple = params.get("simple").map(|v| as_flag("simple", v)).transpose()?.unwrap_or(false);
        if simple && params.contains_key("m") {
            return Err(invalid("m", "m cannot be combined with simple assignment"));
        }

        debug!("esquema {}: n={}, unidades={}, estratos={}, K={}",
               if simple { "simple" } else { "completo" },
               n,
               n_units,
               strata.len(),
               conditions.len());
        Ok(Arc::new(StratifiedScheme::new(conditions,
                                          probabilities,
                                          simple,
                                          unit_of_row,
                                          strata,
                                          request.blocks.clone(),
                                          request.clusters.clone())))
    }
}

/// Filas de la tabla, `N` explícito o la longitud de bloques/clusters.
fn resolve_n(request: &SchemeRequest) -> Result<usize, SchemeError> {
    let explicit = request.params.get("N").map(|v| as_count("N", v)).transpose()?;
    match (request.n, explicit) {
        (Some(rows), Some(n)) if rows != n => Err(SchemeError::LengthMismatch { what: "N".to_string(),
                                                                                expected: rows,
                                                                                found: n }),
        (Some(rows), _) => Ok(rows),
        (None, Some(n)) => Ok(n),
        (None, None) => request.blocks
                               .as_ref()
                               .or(request.clusters.as_ref())
                               .map(Vec::len)
                               .ok_or(SchemeError::MissingN),
    }
}

fn resolve_conditions(params: &IndexMap<String, Value>) -> Result<Vec<Value>, SchemeError> {
    let num_arms = params.get("num_arms").map(|v| as_count("num_arms", v)).transpose()?;
    let conditions = match (params.get("conditions"), num_arms) {
        (Some(conditions), arms) => {
            let conditions = as_sequence(conditions);
            if let Some(arms) = arms {
                if arms != conditions.len() {
                    return Err(invalid("num_arms", format!("{arms} arms but {} conditions", conditions.len())));
                }
            }
            conditions
        }
        (None, Some(arms)) => (1..=arms).map(Value::from).collect(),
        (None, None) => vec![Value::from(0), Value::from(1)],
    };
    if conditions.is_empty() {
        return Err(invalid("conditions", "at least one condition is required"));
    }
    for (i, c) in conditions.iter().enumerate() {
        if conditions[..i].contains(c) {
            return Err(invalid("conditions", format!("condition {c} appears more than once")));
        }
    }
    Ok(conditions)
}

fn resolve_probabilities(params: &IndexMap<String, Value>, k: usize, n_units: usize, blocked: bool) -> Result<Vec<f64>, SchemeError> {
    let given: Vec<&str> = ["prob", "prob_each", "m"].into_iter().filter(|name| params.contains_key(*name)).collect();
    if given.len() > 1 {
        return Err(invalid(given[1], format!("cannot be combined with {}", given[0])));
    }

    let probabilities = match given.first().copied() {
        Some("prob") => {
            if k != 2 {
                return Err(invalid("prob", "only valid with two conditions; use prob_each"));
            }
            let p = as_probability("prob", &params["prob"])?;
            vec![1.0 - p, p]
        }
        Some("prob_each") => {
            let each = as_probabilities("prob_each", &params["prob_each"])?;
            if each.len() != k {
                return Err(SchemeError::LengthMismatch { what: "prob_each".to_string(),
                                                         expected: k,
                                                         found: each.len() });
            }
            each
        }
        Some(_) => {
            if k != 2 {
                return Err(invalid("m", "only valid with two conditions"));
            }
            if blocked {
                return Err(invalid("m", "m cannot be combined with blocks"));
            }
            let m = as_count("m", &params["m"])?;
            if m > n_units {
                return Err(invalid("m", format!("m = {m} exceeds the {n_units} assignable units")));
            }
            let p = if n_units == 0 { 0.0 } else { m as f64 / n_units as f64 };
            vec![1.0 - p, p]
        }
        None => vec![1.0 / k as f64; k],
    };

    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > SUM_EPS {
        return Err(invalid("prob_each", format!("probabilities sum to {total}, not 1")));
    }
    Ok(probabilities)
}

/// Unidad de asignación por fila y unidades por estrato. Sin clusters cada
/// fila es su propia unidad; con clusters, cada cluster debe caer entero
/// dentro de un bloque.
fn units_and_strata(n: usize, blocks: Option<&[Value]>, clusters: Option<&[Value]>) -> Result<(Vec<usize>, Vec<Vec<usize>>), SchemeError> {
    let mut unit_of_row = Vec::with_capacity(n);
    let mut unit_block: Vec<String> = Vec::new();
    let mut cluster_index: IndexMap<String, usize> = IndexMap::new();

    for row in 0..n {
        let block = blocks.map(|b| key(&b[row])).unwrap_or_default();
        let unit = match clusters {
            Some(clusters) => {
                let cluster = key(&clusters[row]);
                match cluster_index.get(&cluster) {
                    Some(&unit) => {
                        if unit_block[unit] != block {
                            return Err(invalid("clusters", format!("cluster {cluster} is not nested within a single block")));
                        }
                        unit
                    }
                    None => {
                        let unit = unit_block.len();
                        cluster_index.insert(cluster, unit);
                        unit_block.push(block);
                        unit
                    }
                }
            }
            None => {
                unit_block.push(block);
                row
            }
        };
        unit_of_row.push(unit);
    }

    let mut strata: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (unit, block) in unit_block.iter().enumerate() {
        strata.entry(block.as_str()).or_default().push(unit);
    }
    Ok((unit_of_row, strata.into_values().collect()))
}
