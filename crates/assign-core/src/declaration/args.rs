//! Captura de argumentos nombrados.
//!
//! `Arguments` acepta un conjunto arbitrario de argumentos sin interpretar
//! su significado: el step no sabe de antemano qué nombres usará su handler.
//! `capture` sólo parsea; no evalúa nada.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use super::artifact::DeclarationArtifact;
use crate::constants::TARGET_SCOPE_SEPARATOR;
use crate::errors::DeclareTimeError;
use crate::expr::{DeferredExpr, Env};
use crate::handler::Handler;

#[derive(Debug, Clone)]
enum ArgInput {
    Source(String),
    Value(Value),
}

/// Argumentos tal como los escribe el caller.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    entries: IndexMap<String, ArgInput>,
    env: Env,
    label: Option<String>,
    handler: Option<Arc<dyn Handler>>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Argumento como código fuente diferido (`"block"`, `"N / 2"`, `"\"a\""`).
    pub fn arg(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.entries.insert(name.into(), ArgInput::Source(source.into()));
        self
    }

    /// Argumento como valor constante ya construido.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), ArgInput::Value(value.into()));
        self
    }

    /// Argumento que sólo aplica al procesar la variable objetivo `target`
    /// y que sustituye al argumento compartido del mismo nombre.
    pub fn arg_for(self, target: &str, name: &str, source: impl Into<String>) -> Self {
        self.arg(scoped_name(name, target), source)
    }

    /// Entorno léxico de definición compartido por todos los argumentos.
    pub fn env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sustituye el handler por defecto del tipo de step.
    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn get_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn custom_handler(&self) -> Option<&Arc<dyn Handler>> {
        self.handler.as_ref()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parsea cada argumento en una `DeferredExpr` ligada al entorno.
    pub fn capture(&self) -> Result<IndexMap<String, DeferredExpr>, DeclareTimeError> {
        let mut captured = IndexMap::with_capacity(self.entries.len());
        for (name, input) in &self.entries {
            let expr = match input {
                ArgInput::Source(source) => DeferredExpr::parse(source, self.env.clone()).map_err(|err| {
                    DeclareTimeError::new(format!("could not parse argument `{name}`: {err}"), self.describe())
                })?,
                ArgInput::Value(value) => DeferredExpr::from_value(value.clone(), self.env.clone()),
            };
            captured.insert(name.clone(), expr);
        }
        Ok(captured)
    }

    /// Descripción JSON para errores previos a la captura.
    pub fn describe(&self) -> Value {
        let args: Map<String, Value> = self.entries
                                           .iter()
                                           .map(|(name, input)| {
                                               let source = match input {
                                                   ArgInput::Source(s) => s.clone(),
                                                   ArgInput::Value(v) => v.to_string(),
                                               };
                                               (name.clone(), json!({ "source": source }))
                                           })
                                           .collect();
        json!({
            "label": self.label,
            "handler": self.handler.as_ref().map(|h| h.id().to_string()),
            "args": args,
        })
    }
}

/// Argumento capturado dentro de una declaración.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedArg {
    Deferred(DeferredExpr),
    Artifact(Arc<DeclarationArtifact>),
}

impl CapturedArg {
    pub fn as_deferred(&self) -> Option<&DeferredExpr> {
        match self {
            CapturedArg::Deferred(expr) => Some(expr),
            CapturedArg::Artifact(_) => None,
        }
    }

    pub fn describe(&self) -> Value {
        match self {
            CapturedArg::Deferred(expr) => json!({ "source": expr.source(), "shape": expr.shape() }),
            CapturedArg::Artifact(artifact) => json!({ "artifact": artifact.hash(), "replaces": artifact.replaced() }),
        }
    }
}

/// `blocks` + `Z2` -> `blocks@Z2`.
pub fn scoped_name(name: &str, target: &str) -> String {
    format!("{name}{TARGET_SCOPE_SEPARATOR}{target}")
}

/// `blocks@Z2` -> (`blocks`, Some(`Z2`)); `blocks` -> (`blocks`, None).
pub fn split_scope(key: &str) -> (&str, Option<&str>) {
    match key.split_once(TARGET_SCOPE_SEPARATOR) {
        Some((name, target)) => (name, Some(target)),
        None => (key, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ArgShape;

    #[test]
    fn capture_accepts_arbitrary_names_in_order() {
        let args = Arguments::new().arg("zeta", "1")
                                   .arg("blocks", "block")
                                   .value("conditions", json!(["a", "b"]))
                                   .arg("whatever_the_handler_wants", "N * 2");
        let captured = args.capture().expect("capture");
        assert_eq!(captured.keys().collect::<Vec<_>>(), vec!["zeta", "blocks", "conditions", "whatever_the_handler_wants"]);
        assert_eq!(captured["blocks"].shape(), ArgShape::Reference);
        assert_eq!(captured["conditions"].shape(), ArgShape::Sequence);
    }

    #[test]
    fn capture_reports_unparseable_argument() {
        let err = Arguments::new().label("a1").arg("prob", "0.5 +").capture().unwrap_err();
        assert!(err.message.contains("`prob`"), "{}", err.message);
        assert_eq!(err.attempted["label"], json!("a1"));
        assert_eq!(err.attempted["args"]["prob"]["source"], json!("0.5 +"));
    }

    #[test]
    fn scoped_names_round_trip() {
        let key = scoped_name("blocks", "Z2");
        assert_eq!(key, "blocks@Z2");
        assert_eq!(split_scope(&key), ("blocks", Some("Z2")));
        assert_eq!(split_scope("prob"), ("prob", None));
    }
}
