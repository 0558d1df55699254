use log::{debug, info};

use super::{check_common, check_structural, try_factor, TargetPolicy, Validator};
use crate::constants::DEFAULT_TARGET;
use crate::declaration::{CapturedArg, Declaration, DeclarationState};
use crate::errors::DeclareTimeError;

/// Validador de los steps de asignación.
///
/// Además de los chequeos comunes exige parámetros estructurales desnudos e
/// intenta el factoring con la capacidad del handler. Con un handler
/// suministrado por el usuario no hay factoring ni chequeo estructural: el
/// core no conoce los argumentos de ese handler.
#[derive(Debug, Clone)]
pub struct AssignmentValidator {
    policy: TargetPolicy,
}

impl Default for AssignmentValidator {
    fn default() -> Self {
        Self { policy: TargetPolicy::Default(DEFAULT_TARGET.to_string()) }
    }
}

impl AssignmentValidator {
    pub fn new(policy: TargetPolicy) -> Self {
        Self { policy }
    }
}

impl Validator for AssignmentValidator {
    fn validate(&self, declaration: &Declaration) -> Result<Declaration, DeclareTimeError> {
        if declaration.is_validated() {
            debug!("'{}' ya estaba validada", declaration.label());
            return Ok(declaration.clone());
        }

        let targets = check_common(declaration, &self.policy)?;
        let custom = declaration.has_custom_handler();
        if !custom {
            check_structural(declaration)?;
        }

        let factored = match declaration.handler().randomizer() {
            Some(randomizer) if !custom => try_factor(declaration, randomizer.as_ref()),
            _ => None,
        };

        let mut metadata = declaration.metadata().clone();
        metadata.state = DeclarationState::Validated;
        metadata.target_variables = targets;

        let validated = match factored {
            Some(args) => {
                metadata.factored = true;
                metadata.artifact_hash = args.values().find_map(|arg| match arg {
                                                          CapturedArg::Artifact(artifact) => Some(artifact.hash().to_string()),
                                                          CapturedArg::Deferred(_) => None,
                                                      });
                declaration.clone().with_args(args).with_metadata(metadata)
            }
            None => declaration.clone().with_metadata(metadata),
        };

        info!("declaración '{}' validada (targets={:?}, factored={})",
              validated.label(),
              validated.target_variables(),
              validated.is_factored());
        Ok(validated)
    }
}
