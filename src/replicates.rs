//! Aplicación de un mismo step a muchas tablas simuladas en paralelo.

use assign_core::{DataTable, Step};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::AppError;

/// Proporción media de unidades tratadas por variable objetivo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicateSummary {
    pub replicates: usize,
    pub rows: usize,
    pub mean_treated_share: IndexMap<String, f64>,
}

/// Tabla de `rows` unidades repartidas en dos sitios (`site` = "north"/"south").
pub fn sites_table(rows: usize) -> Result<DataTable, AppError> {
    let unit: Vec<Value> = (0..rows).map(|i| json!(i + 1)).collect();
    let site: Vec<Value> = (0..rows).map(|i| json!(if i % 2 == 0 { "north" } else { "south" })).collect();
    Ok(DataTable::from_columns([("unit", unit), ("site", site)])?)
}

/// Aplica `step` a `replicates` copias de `data`. Con semilla, la réplica
/// `i` usa `StdRng::seed_from_u64(seed + i)` y el resultado es reproducible.
pub fn run_replicates(step: &Step, data: &DataTable, replicates: usize, seed: Option<u64>) -> Result<ReplicateSummary, AppError> {
    let targets = step.declaration().target_variables().to_vec();
    let shares: Vec<Vec<f64>> = (0..replicates).into_par_iter()
                                               .map(|i| -> Result<Vec<f64>, AppError> {
                                                   let mut rng = match seed {
                                                       Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
                                                       None => StdRng::from_entropy(),
                                                   };
                                                   let out = step.apply_with_rng(data, &mut rng)?;
                                                   Ok(targets.iter().map(|t| treated_share(&out, t)).collect())
                                               })
                                               .collect::<Result<_, AppError>>()?;

    let mut mean_treated_share = IndexMap::with_capacity(targets.len());
    for (j, target) in targets.iter().enumerate() {
        let total: f64 = shares.iter().map(|row| row[j]).sum();
        let mean = if replicates == 0 { 0.0 } else { total / replicates as f64 };
        mean_treated_share.insert(target.clone(), mean);
    }
    Ok(ReplicateSummary { replicates,
                          rows: data.n_rows(),
                          mean_treated_share })
}

/// Fracción de filas con condición `1` en la columna `target`.
fn treated_share(table: &DataTable, target: &str) -> f64 {
    match table.column(target) {
        Some(column) if !column.is_empty() => {
            column.iter().filter(|v| v.as_f64() == Some(1.0)).count() as f64 / column.len() as f64
        }
        _ => 0.0,
    }
}
