//! Constantes del core.
//!
//! Nombres reservados de argumentos y convenciones de nombres de columnas.
//! `CORE_VERSION` participa en el fingerprint de las declaraciones: cambiarlo
//! invalida fingerprints previos aunque la declaración no cambie.

/// Versión lógica del core incluida en `Declaration::fingerprint`.
pub const CORE_VERSION: &str = "A1.0";

/// Parámetro que recibe la tabla (nunca se captura como argumento del esquema).
pub const DATA_PARAM: &str = "data";

/// Parámetro con el/los nombres de la(s) variable(s) objetivo.
pub const TARGET_PARAM: &str = "assignment_variable";

/// Flag para expandir la matriz de probabilidades por condición.
pub const MATRIX_FLAG_PARAM: &str = "append_probabilities_matrix";

/// Nombre bajo el que queda el artifact tras el factoring.
pub const ARTIFACT_PARAM: &str = "declaration";

/// Variable objetivo por defecto.
pub const DEFAULT_TARGET: &str = "Z";

/// Símbolo implícito con el número de filas de la tabla.
pub const ROW_COUNT_SYMBOL: &str = "N";

/// Sufijo de la columna con la probabilidad de la condición realizada.
pub const COND_PROB_SUFFIX: &str = "_cond_prob";

/// Parámetros estructurales: deben ser referencias a columnas, nunca strings.
pub const STRUCTURAL_PARAMS: &[&str] = &["blocks", "clusters"];

/// Parámetros que consume el handler y nunca entran al esquema.
pub const HANDLER_PARAMS: &[&str] = &[DATA_PARAM, TARGET_PARAM, MATRIX_FLAG_PARAM, ARTIFACT_PARAM];

/// Separador de argumentos con alcance por variable objetivo (`blocks@Z2`).
pub const TARGET_SCOPE_SEPARATOR: char = '@';
