//! Declaraciones de steps.
//!
//! Una `Declaration` agrupa el handler, los argumentos capturados (diferidos
//! o, tras el factoring, un artifact), la etiqueta, el tipo de step y la
//! metadata del validador. Es un valor: el validador devuelve una
//! declaración nueva y nunca modifica la recibida. Clonar es barato (handler
//! y artifact viven tras `Arc`), así que una declaración validada puede
//! compartirse entre aplicaciones concurrentes.

pub mod args;
pub mod artifact;
pub mod metadata;

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::constants::{ARTIFACT_PARAM, CORE_VERSION};
use crate::expr::DeferredExpr;
use crate::handler::Handler;
use crate::hashing::hash_value;

pub use args::{scoped_name, split_scope, Arguments, CapturedArg};
pub use artifact::DeclarationArtifact;
pub use metadata::{DeclarationMetadata, DeclarationState};

/// Tipo de step declarado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Assignment,
    Custom,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Assignment => "assignment",
            StepType::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Declaration {
    handler: Arc<dyn Handler>,
    captured_args: IndexMap<String, CapturedArg>,
    label: String,
    step_type: StepType,
    metadata: DeclarationMetadata,
}

impl Declaration {
    /// Declaración recién creada (estado `Created`).
    pub fn new(handler: Arc<dyn Handler>,
               args: IndexMap<String, DeferredExpr>,
               label: impl Into<String>,
               step_type: StepType,
               custom_handler: bool)
               -> Self {
        let captured_args = args.into_iter().map(|(name, expr)| (name, CapturedArg::Deferred(expr))).collect();
        Self { handler,
               captured_args,
               label: label.into(),
               step_type,
               metadata: DeclarationMetadata { declaration_id: Uuid::new_v4(),
                                               declared_at: Utc::now(),
                                               custom_handler,
                                               ..Default::default() } }
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn args(&self) -> &IndexMap<String, CapturedArg> {
        &self.captured_args
    }

    pub fn arg(&self, name: &str) -> Option<&CapturedArg> {
        self.captured_args.get(name)
    }

    pub fn deferred(&self, name: &str) -> Option<&DeferredExpr> {
        self.arg(name).and_then(CapturedArg::as_deferred)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn step_type(&self) -> StepType {
        self.step_type
    }

    pub fn metadata(&self) -> &DeclarationMetadata {
        &self.metadata
    }

    pub fn state(&self) -> DeclarationState {
        self.metadata.state
    }

    pub fn is_validated(&self) -> bool {
        self.metadata.state == DeclarationState::Validated
    }

    pub fn is_factored(&self) -> bool {
        self.metadata.factored
    }

    pub fn has_custom_handler(&self) -> bool {
        self.metadata.custom_handler
    }

    pub fn target_variables(&self) -> &[String] {
        &self.metadata.target_variables
    }

    pub fn artifact(&self) -> Option<&Arc<DeclarationArtifact>> {
        match self.captured_args.get(ARTIFACT_PARAM) {
            Some(CapturedArg::Artifact(artifact)) => Some(artifact),
            _ => None,
        }
    }

    /// Nueva declaración con otros argumentos capturados.
    pub fn with_args(mut self, args: IndexMap<String, CapturedArg>) -> Self {
        self.captured_args = args;
        self
    }

    /// Nueva declaración con otra metadata.
    pub fn with_metadata(mut self, metadata: DeclarationMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Hash estable del comportamiento de la declaración: dos declaraciones
    /// con el mismo fingerprint producen el mismo step. El estado, el id, la
    /// fecha y `metadata.extra` no participan.
    pub fn fingerprint(&self) -> String {
        let args: Vec<Value> = self.captured_args
                                   .iter()
                                   .map(|(name, arg)| match arg {
                                       CapturedArg::Deferred(expr) => json!([name, expr.source()]),
                                       CapturedArg::Artifact(artifact) => json!([name, format!("artifact:{}", artifact.hash())]),
                                   })
                                   .collect();
        hash_value(&json!({
            "core_version": CORE_VERSION,
            "label": self.label,
            "step_type": self.step_type,
            "handler": self.handler.id(),
            "args": args,
            "targets": self.metadata.target_variables,
            "factored": self.metadata.factored,
        }))
    }

    /// Resumen JSON (también es el payload de `DeclareTimeError`).
    pub fn describe(&self) -> Value {
        let args: Map<String, Value> = self.captured_args.iter().map(|(name, arg)| (name.clone(), arg.describe())).collect();
        json!({
            "label": self.label,
            "step_type": self.step_type,
            "handler": self.handler.id(),
            "args": args,
            "metadata": serde_json::to_value(&self.metadata).unwrap_or_default(),
        })
    }
}
