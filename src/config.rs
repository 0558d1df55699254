//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
use std::env;

use log::warn;
use once_cell::sync::Lazy;

use crate::errors::AppError;

pub const DEFAULT_REPLICATES: usize = 100;
pub const DEFAULT_ROWS: usize = 6;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv(); // ignora error si no existe .env
});

/// Parámetros de la demo de réplicas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Semilla base; la réplica `i` usa `seed + i`. Sin semilla se usa entropía.
    pub seed: Option<u64>,
    /// Número de tablas simuladas.
    pub replicates: usize,
    /// Filas por tabla.
    pub rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { seed: None,
               replicates: DEFAULT_REPLICATES,
               rows: DEFAULT_ROWS }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero leyendo de una función (tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let seed = parse(&lookup, "ASSIGNFLOW_SEED")?;
        let replicates = parse(&lookup, "ASSIGNFLOW_REPLICATES")?.unwrap_or(defaults.replicates);
        let rows = parse(&lookup, "ASSIGNFLOW_ROWS")?.unwrap_or(defaults.rows);
        if rows == 0 {
            return Err(AppError::Config("ASSIGNFLOW_ROWS debe ser mayor que 0".into()));
        }
        Ok(Self { seed, replicates, rows })
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
    where F: Fn(&str) -> Option<String>,
          T: std::str::FromStr
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| AppError::Config(format!("{key}='{raw}' no es válido"))),
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez. Un
/// valor inválido cae a los defaults con un warning.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::from_env().unwrap_or_else(|err| {
                             warn!("{err}; usando configuración por defecto");
                             AppConfig::default()
                         })
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(AppConfig::from_lookup(lookup(&[])).unwrap(), AppConfig::default());
    }

    #[test]
    fn reads_all_keys() {
        let cfg = AppConfig::from_lookup(lookup(&[("ASSIGNFLOW_SEED", "7"), ("ASSIGNFLOW_REPLICATES", "10"), ("ASSIGNFLOW_ROWS", " 12 ")])).unwrap();
        assert_eq!(cfg, AppConfig { seed: Some(7), replicates: 10, rows: 12 });
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(AppConfig::from_lookup(lookup(&[("ASSIGNFLOW_ROWS", "six")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("ASSIGNFLOW_ROWS", "0")])).is_err());
    }
}
