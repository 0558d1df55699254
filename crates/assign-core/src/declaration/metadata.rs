use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Estado de una declaración.
///
/// Transiciones válidas: `Created` -> `Validated`. No hay vuelta atrás; las
/// aplicaciones (bind/apply) no cambian el estado.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationState {
    #[default]
    Created,
    Validated,
}

/// Metadata registrada por el validador.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeclarationMetadata {
    /// Identificador de la declaración (trazas); se conserva al validar.
    pub declaration_id: Uuid,
    pub declared_at: DateTime<Utc>,
    pub state: DeclarationState,
    /// Variables objetivo en el orden declarado.
    pub target_variables: Vec<String>,
    /// Hubo factoring (existe un argumento artifact).
    pub factored: bool,
    /// Handler suministrado por el usuario.
    pub custom_handler: bool,
    pub artifact_hash: Option<String>,
    /// Anotaciones libres. Ni éstas ni el id/fecha entran al fingerprint.
    pub extra: Map<String, Value>,
}
