//! Esquema estratificado: asignación completa o simple, por bloques y a
//! nivel de cluster.
//!
//! La asignación completa reparte `floor(s·p_k)` unidades por condición en
//! cada estrato de tamaño `s` y el resto por muestreo sistemático sobre las
//! partes fraccionarias, de modo que la probabilidad marginal de cada unidad
//! es exactamente `p_k`.

use assign_core::{AssignmentScheme, SchemeError};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde_json::{json, Value};

/// Tolerancia para considerar entero un `s·p_k`.
const INTEGER_EPS: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct StratifiedScheme {
    conditions: Vec<Value>,
    probabilities: Vec<f64>,
    simple: bool,
    /// Fila -> unidad de asignación (cluster o la propia fila).
    unit_of_row: Vec<usize>,
    /// Unidades de cada estrato (bloque), en orden de aparición.
    strata: Vec<Vec<usize>>,
    n_units: usize,
    blocks: Option<Vec<Value>>,
    clusters: Option<Vec<Value>>,
}

impl StratifiedScheme {
    pub(crate) fn new(conditions: Vec<Value>,
                      probabilities: Vec<f64>,
                      simple: bool,
                      unit_of_row: Vec<usize>,
                      strata: Vec<Vec<usize>>,
                      blocks: Option<Vec<Value>>,
                      clusters: Option<Vec<Value>>)
                      -> Self {
        let n_units = strata.iter().map(Vec::len).sum();
        Self { conditions,
               probabilities,
               simple,
               unit_of_row,
               strata,
               n_units,
               blocks,
               clusters }
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn n_units(&self) -> usize {
        self.n_units
    }

    pub fn is_simple(&self) -> bool {
        self.simple
    }

    /// Índice de condición por unidad.
    fn draw_units(&self, rng: &mut dyn RngCore) -> Vec<usize> {
        let mut by_unit = vec![0; self.n_units];
        if self.simple {
            for slot in by_unit.iter_mut() {
                *slot = categorical(&self.probabilities, rng.gen::<f64>());
            }
            return by_unit;
        }
        for stratum in &self.strata {
            let mut draws = allocate(stratum.len(), &self.probabilities, rng);
            draws.shuffle(rng);
            for (unit, k) in stratum.iter().zip(draws) {
                by_unit[*unit] = k;
            }
        }
        by_unit
    }
}

/// Condición cuyo intervalo acumulado contiene `u`.
fn categorical(probabilities: &[f64], u: f64) -> usize {
    let mut cumulative = 0.0;
    for (k, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return k;
        }
    }
    last_positive(probabilities)
}

fn last_positive(weights: &[f64]) -> usize {
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
}

/// Vector de `size` índices de condición con los conteos de la asignación
/// completa (sin barajar).
fn allocate(size: usize, probabilities: &[f64], rng: &mut dyn RngCore) -> Vec<usize> {
    let mut counts = Vec::with_capacity(probabilities.len());
    let mut fractions = Vec::with_capacity(probabilities.len());
    for p in probabilities {
        let mut expected = size as f64 * p;
        if (expected - expected.round()).abs() < INTEGER_EPS {
            expected = expected.round();
        }
        let whole = expected.floor();
        counts.push(whole as usize);
        fractions.push(expected - whole);
    }

    let remainder = size.saturating_sub(counts.iter().sum());
    if remainder > 0 {
        // muestreo sistemático: un único arranque uniforme, paso 1
        let start = rng.gen::<f64>();
        let mut cumulative = 0.0;
        let mut k = 0;
        for j in 0..remainder {
            let point = start + j as f64;
            while k < fractions.len() && cumulative + fractions[k] <= point {
                cumulative += fractions[k];
                k += 1;
            }
            let pick = if k < fractions.len() { k } else { last_positive(&fractions) };
            counts[pick] += 1;
        }
    }

    counts.iter().enumerate().flat_map(|(k, c)| std::iter::repeat(k).take(*c)).collect()
}

impl AssignmentScheme for StratifiedScheme {
    fn n(&self) -> usize {
        self.unit_of_row.len()
    }

    fn conditions(&self) -> &[Value] {
        &self.conditions
    }

    fn realize(&self, rng: &mut dyn RngCore) -> Vec<Value> {
        let by_unit = self.draw_units(rng);
        self.unit_of_row.iter().map(|unit| self.conditions[by_unit[*unit]].clone()).collect()
    }

    fn condition_probabilities(&self, assignment: &[Value]) -> Result<Vec<f64>, SchemeError> {
        if assignment.len() != self.n() {
            return Err(SchemeError::LengthMismatch { what: "assignment".to_string(),
                                                     expected: self.n(),
                                                     found: assignment.len() });
        }
        assignment.iter()
                  .map(|value| {
                      self.conditions
                          .iter()
                          .position(|c| c == value)
                          .map(|k| self.probabilities[k])
                          .ok_or_else(|| SchemeError::UnknownCondition(value.to_string()))
                  })
                  .collect()
    }

    fn probability_matrix(&self) -> Vec<Vec<f64>> {
        vec![self.probabilities.clone(); self.n()]
    }

    fn describe(&self) -> Value {
        let kind = if self.simple { "simple" } else { "complete" };
        json!({
            "scheme": kind,
            "n": self.n(),
            "conditions": self.conditions,
            "probabilities": self.probabilities,
            "blocks": self.blocks,
            "clusters": self.clusters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn count(values: &[usize], k: usize) -> usize {
        values.iter().filter(|v| **v == k).count()
    }

    #[test]
    fn allocation_is_exact_when_size_divides() {
        let mut rng = StdRng::seed_from_u64(7);
        let draws = allocate(6, &[0.5, 0.5], &mut rng);
        assert_eq!((count(&draws, 0), count(&draws, 1)), (3, 3));
        let draws = allocate(9, &[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0], &mut rng);
        assert_eq!((count(&draws, 0), count(&draws, 1), count(&draws, 2)), (3, 3, 3));
    }

    #[test]
    fn remainder_is_spread_by_systematic_sampling() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut treated = 0;
        for _ in 0..4000 {
            let draws = allocate(5, &[0.5, 0.5], &mut rng);
            let t = count(&draws, 1);
            assert!(t == 2 || t == 3, "{t}");
            treated += t;
        }
        let mean = treated as f64 / 4000.0;
        assert!((mean - 2.5).abs() < 0.1, "{mean}");
    }

    #[test]
    fn clusters_share_their_condition() {
        let scheme = StratifiedScheme::new(vec![json!(0), json!(1)],
                                           vec![0.5, 0.5],
                                           false,
                                           vec![0, 0, 1, 1, 2, 2, 3, 3],
                                           vec![vec![0, 1, 2, 3]],
                                           None,
                                           Some(vec![json!("a"); 8]));
        let z = scheme.realize(&mut StdRng::seed_from_u64(3));
        for pair in z.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
        assert_eq!(z.iter().filter(|v| **v == json!(1)).count(), 4);
    }

    #[test]
    fn unknown_condition_is_rejected() {
        let scheme = StratifiedScheme::new(vec![json!(0), json!(1)], vec![0.5, 0.5], true, vec![0], vec![vec![0]], None, None);
        assert!(matches!(scheme.condition_probabilities(&[json!(2)]), Err(SchemeError::UnknownCondition(_))));
        assert!(scheme.condition_probabilities(&[]).is_err());
    }
}
