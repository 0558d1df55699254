//! Artifact de declaración: esquema precomputado sin datos.
//!
//! Se construye una única vez en validación y nunca se modifica; su hash es
//! el del JSON canónico de `AssignmentScheme::describe`.

use std::sync::Arc;

use crate::hashing::hash_value;
use crate::scheme::AssignmentScheme;

#[derive(Debug, Clone)]
pub struct DeclarationArtifact {
    scheme: Arc<dyn AssignmentScheme>,
    hash: String,
    replaced: Vec<String>,
}

impl DeclarationArtifact {
    /// `replaced`: nombres de los argumentos capturados que sustituye.
    pub fn new(scheme: Arc<dyn AssignmentScheme>, replaced: Vec<String>) -> Self {
        let hash = hash_value(&scheme.describe());
        Self { scheme, hash, replaced }
    }

    pub fn scheme(&self) -> &Arc<dyn AssignmentScheme> {
        &self.scheme
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn replaced(&self) -> &[String] {
        &self.replaced
    }
}

impl PartialEq for DeclarationArtifact {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.replaced == other.replaced
    }
}
