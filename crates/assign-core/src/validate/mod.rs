//! Validación de declaraciones (antes de ver datos).
//!
//! Un `Validator` recibe una declaración `Created` y devuelve una nueva en
//! estado `Validated`, o un `DeclareTimeError`. Nunca modifica la recibida y
//! nunca devuelve objetos a medio construir. Validar una declaración ya
//! validada devuelve una equivalente.

pub mod assignment;

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::constants::{ARTIFACT_PARAM, DATA_PARAM, HANDLER_PARAMS, MATRIX_FLAG_PARAM, STRUCTURAL_PARAMS, TARGET_PARAM};
use crate::declaration::{split_scope, CapturedArg, Declaration, DeclarationArtifact, DeclarationState};
use crate::errors::DeclareTimeError;
use crate::expr::{ArgShape, DeferredExpr, Expr};
use crate::scheme::{Randomizer, SchemeRequest};

pub use assignment::AssignmentValidator;

pub trait Validator: Send + Sync + std::fmt::Debug {
    fn validate(&self, declaration: &Declaration) -> Result<Declaration, DeclareTimeError>;
}

/// Qué hacer cuando falta el parámetro de variable objetivo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetPolicy {
    /// Usar este nombre.
    Default(String),
    /// Fallar con `DeclareTimeError`.
    Required,
}

/// Validador mínimo: nombres reservados, variables objetivo y alcance de
/// los argumentos. No factoriza.
#[derive(Debug, Clone)]
pub struct BasicValidator {
    policy: TargetPolicy,
}

impl BasicValidator {
    pub fn new(policy: TargetPolicy) -> Self {
        Self { policy }
    }
}

impl Validator for BasicValidator {
    fn validate(&self, declaration: &Declaration) -> Result<Declaration, DeclareTimeError> {
        if declaration.is_validated() {
            return Ok(declaration.clone());
        }
        let targets = check_common(declaration, &self.policy)?;
        let mut metadata = declaration.metadata().clone();
        metadata.state = DeclarationState::Validated;
        metadata.target_variables = targets;
        Ok(declaration.clone().with_metadata(metadata))
    }
}

fn fail(declaration: &Declaration, message: impl Into<String>) -> DeclareTimeError {
    DeclareTimeError::new(message, declaration.describe())
}

/// Chequeos compartidos por todos los validadores. Devuelve las variables
/// objetivo resueltas.
pub fn check_common(declaration: &Declaration, policy: &TargetPolicy) -> Result<Vec<String>, DeclareTimeError> {
    check_reserved(declaration)?;
    let targets = resolve_targets(declaration, policy)?;
    check_scopes(declaration, &targets)?;
    Ok(targets)
}

/// `data` y `declaration` los pone el runtime; el caller no puede pasarlos.
fn check_reserved(declaration: &Declaration) -> Result<(), DeclareTimeError> {
    for (key, arg) in declaration.args() {
        let (name, _) = split_scope(key);
        let reserved = name == DATA_PARAM || (name == ARTIFACT_PARAM && matches!(arg, CapturedArg::Deferred(_)));
        if reserved {
            return Err(fail(declaration, format!("argument name `{name}` is reserved")));
        }
    }
    Ok(())
}

/// Resuelve la lista ordenada de variables objetivo a partir de la forma
/// sintáctica del argumento (no se evalúa nada).
pub fn resolve_targets(declaration: &Declaration, policy: &TargetPolicy) -> Result<Vec<String>, DeclareTimeError> {
    let Some(expr) = declaration.deferred(TARGET_PARAM) else {
        return match policy {
            TargetPolicy::Default(name) => Ok(vec![name.clone()]),
            TargetPolicy::Required => Err(fail(declaration, format!("Must provide {TARGET_PARAM}."))),
        };
    };

    let targets = match expr.expr() {
        Expr::Symbol(name) => vec![name.clone()],
        Expr::Literal(Value::String(name)) => vec![name.clone()],
        Expr::Vector(items) => target_names(declaration, items)?,
        Expr::Call { function, args } if function == "c" => target_names(declaration, args)?,
        _ => {
            return Err(fail(declaration,
                            format!("{TARGET_PARAM} must be a name or a list of names, got `{}`", expr.source())))
        }
    };

    if targets.is_empty() {
        return Err(fail(declaration, format!("{TARGET_PARAM} must name at least one variable")));
    }
    for (i, name) in targets.iter().enumerate() {
        if name.is_empty() {
            return Err(fail(declaration, format!("{TARGET_PARAM} contains an empty name")));
        }
        if targets[..i].contains(name) {
            return Err(fail(declaration, format!("{TARGET_PARAM} names '{name}' more than once")));
        }
    }
    Ok(targets)
}

fn target_names(declaration: &Declaration, items: &[Expr]) -> Result<Vec<String>, DeclareTimeError> {
    items.iter()
         .map(|item| match item {
             Expr::Symbol(name) => Ok(name.clone()),
             Expr::Literal(Value::String(name)) => Ok(name.clone()),
             _ => Err(fail(declaration, format!("{TARGET_PARAM} entries must be names"))),
         })
         .collect()
}

/// Los argumentos `name@target` deben apuntar a una variable declarada y no
/// pueden redefinir la propia lista de variables.
fn check_scopes(declaration: &Declaration, targets: &[String]) -> Result<(), DeclareTimeError> {
    for key in declaration.args().keys() {
        if let (name, Some(scope)) = split_scope(key) {
            if HANDLER_PARAMS.contains(&name) && name != MATRIX_FLAG_PARAM {
                return Err(fail(declaration, format!("`{name}` cannot be scoped to a target variable")));
            }
            if !targets.iter().any(|t| t == scope) {
                return Err(fail(declaration, format!("argument `{key}` is scoped to unknown target variable '{scope}'")));
            }
        }
    }
    Ok(())
}

/// Los parámetros estructurales deben llegar como nombres desnudos.
pub fn check_structural(declaration: &Declaration) -> Result<(), DeclareTimeError> {
    for (key, arg) in declaration.args() {
        let (name, _) = split_scope(key);
        if !STRUCTURAL_PARAMS.contains(&name) {
            continue;
        }
        let Some(expr) = arg.as_deferred() else { continue };
        if expr.shape() == ArgShape::Literal && matches!(expr.expr(), Expr::Literal(Value::String(_))) {
            let kind = name.strip_suffix('s').unwrap_or(name);
            return Err(fail(declaration, format!("Must provide the bare (unquoted) {kind} variable name to {name}.")));
        }
    }
    Ok(())
}

/// Intenta sustituir los argumentos del esquema por un artifact.
///
/// Evalúa sin datos todos los argumentos que no consume el handler; si todos
/// se evalúan y la capacidad acepta el esquema, devuelve los argumentos
/// reescritos (handler params en su orden original + `declaration`). Si
/// algo falla devuelve `None`: el factoring nunca produce errores.
pub fn try_factor(declaration: &Declaration, randomizer: &dyn Randomizer) -> Option<IndexMap<String, CapturedArg>> {
    if declaration.args().keys().any(|key| split_scope(key).1.is_some()) {
        debug!("factoring omitido en '{}': argumentos por variable objetivo", declaration.label());
        return None;
    }

    let candidates: Vec<(&String, &DeferredExpr)> = declaration.args()
                                                               .iter()
                                                               .filter(|(name, _)| !HANDLER_PARAMS.contains(&name.as_str()))
                                                               .filter_map(|(name, arg)| arg.as_deferred().map(|e| (name, e)))
                                                               .collect();

    let mut values = IndexMap::with_capacity(candidates.len());
    for (name, expr) in &candidates {
        match expr.evaluate_detached() {
            Ok(value) => {
                values.insert((*name).clone(), value);
            }
            Err(err) => {
                debug!("factoring omitido en '{}': `{}` depende de datos ({})", declaration.label(), name, err);
                return None;
            }
        }
    }

    let scheme = match randomizer.declare(&SchemeRequest::from_args(None, values)) {
        Ok(scheme) => scheme,
        Err(err) => {
            debug!("factoring omitido en '{}': {}", declaration.label(), err);
            return None;
        }
    };

    let replaced: Vec<String> = candidates.iter().map(|(name, _)| (*name).clone()).collect();
    let artifact = DeclarationArtifact::new(scheme, replaced);
    debug!("factoring de '{}' -> artifact {}", declaration.label(), artifact.hash());

    let mut args: IndexMap<String, CapturedArg> = declaration.args()
                                                             .iter()
                                                             .filter(|(name, _)| HANDLER_PARAMS.contains(&name.as_str()))
                                                             .map(|(name, arg)| (name.clone(), arg.clone()))
                                                             .collect();
    args.insert(ARTIFACT_PARAM.to_string(), CapturedArg::Artifact(Arc::new(artifact)));
    Some(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{Arguments, StepType};
    use crate::testing::{recording_handler, FixedRandomizer};

    fn declare(args: Arguments) -> Declaration {
        Declaration::new(recording_handler(), args.capture().unwrap(), "test", StepType::Custom, false)
    }

    #[test]
    fn targets_resolve_from_every_shape() {
        let policy = TargetPolicy::Default("Z".into());
        assert_eq!(resolve_targets(&declare(Arguments::new()), &policy).unwrap(), vec!["Z"]);
        assert_eq!(resolve_targets(&declare(Arguments::new().arg(TARGET_PARAM, "W")), &policy).unwrap(), vec!["W"]);
        assert_eq!(resolve_targets(&declare(Arguments::new().arg(TARGET_PARAM, "\"treat.arm\"")), &policy).unwrap(),
                   vec!["treat.arm"]);
        assert_eq!(resolve_targets(&declare(Arguments::new().arg(TARGET_PARAM, "c(\"Z1\", Z2)")), &policy).unwrap(),
                   vec!["Z1", "Z2"]);
    }

    #[test]
    fn required_target_must_be_present() {
        let err = resolve_targets(&declare(Arguments::new()), &TargetPolicy::Required).unwrap_err();
        assert!(err.message.contains(TARGET_PARAM));
    }

    #[test]
    fn empty_or_duplicated_targets_are_rejected() {
        let policy = TargetPolicy::Default("Z".into());
        assert!(resolve_targets(&declare(Arguments::new().arg(TARGET_PARAM, "[]")), &policy).is_err());
        assert!(resolve_targets(&declare(Arguments::new().arg(TARGET_PARAM, "[Z, Z]")), &policy).is_err());
        assert!(resolve_targets(&declare(Arguments::new().arg(TARGET_PARAM, "1 + 2")), &policy).is_err());
    }

    #[test]
    fn literal_structural_argument_is_rejected() {
        let err = check_structural(&declare(Arguments::new().arg("blocks", "\"block\""))).unwrap_err();
        assert_eq!(err.message, "Must provide the bare (unquoted) block variable name to blocks.");
        let err = check_structural(&declare(Arguments::new().arg("clusters", "'cl'"))).unwrap_err();
        assert_eq!(err.message, "Must provide the bare (unquoted) cluster variable name to clusters.");
        assert!(check_structural(&declare(Arguments::new().arg("blocks", "block"))).is_ok());
        assert!(check_structural(&declare(Arguments::new().arg("blocks", "[1, 1, 2, 2]"))).is_ok());
    }

    #[test]
    fn scoped_arguments_must_name_declared_targets() {
        let decl = declare(Arguments::new().arg(TARGET_PARAM, "[Z1, Z2]").arg_for("Z3", "blocks", "Z1"));
        assert!(check_common(&decl, &TargetPolicy::Required).is_err());
        let decl = declare(Arguments::new().arg(TARGET_PARAM, "[Z1, Z2]").arg_for("Z2", "blocks", "Z1"));
        assert_eq!(check_common(&decl, &TargetPolicy::Required).unwrap(), vec!["Z1", "Z2"]);
        let decl = declare(Arguments::new().arg(TARGET_PARAM, "Z1").arg_for("Z1", TARGET_PARAM, "Z2"));
        assert!(check_common(&decl, &TargetPolicy::Required).is_err());
    }

    #[test]
    fn reserved_names_are_rejected() {
        let decl = declare(Arguments::new().arg(DATA_PARAM, "x"));
        assert!(check_common(&decl, &TargetPolicy::Required).is_err());
    }

    #[test]
    fn factoring_is_all_or_nothing() {
        let randomizer = FixedRandomizer::new(4);
        let pure = declare(Arguments::new().arg("N", "4").arg("prob", "0.5").arg(TARGET_PARAM, "Z"));
        let args = try_factor(&pure, &randomizer).expect("factored");
        assert_eq!(args.keys().collect::<Vec<_>>(), vec![TARGET_PARAM, ARTIFACT_PARAM]);
        match &args[ARTIFACT_PARAM] {
            CapturedArg::Artifact(artifact) => assert_eq!(artifact.replaced(), ["N", "prob"]),
            other => panic!("expected artifact, got {other:?}"),
        }

        let impure = declare(Arguments::new().arg("N", "4").arg("blocks", "block"));
        assert!(try_factor(&impure, &randomizer).is_none());

        let rejected = declare(Arguments::new().arg("N", "5"));
        assert!(try_factor(&rejected, &randomizer).is_none());
    }

    #[test]
    fn basic_validator_is_idempotent() {
        let validator = BasicValidator::new(TargetPolicy::Default("Z".into()));
        let once = validator.validate(&declare(Arguments::new().arg("x", "1"))).unwrap();
        let twice = validator.validate(&once).unwrap();
        assert_eq!(once.fingerprint(), twice.fingerprint());
        assert_eq!(twice.state(), DeclarationState::Validated);
    }
}
