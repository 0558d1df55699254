use std::sync::Arc;

use log::{debug, info};

use super::runtime::{bind, Step};
use crate::declaration::{Arguments, Declaration, StepType};
use crate::errors::DeclareTimeError;
use crate::handler::Handler;
use crate::constants::DEFAULT_TARGET;
use crate::validate::{AssignmentValidator, BasicValidator, TargetPolicy, Validator};

/// Constructor genérico de steps: captura, declara y valida.
///
/// Cada tipo de step concreto (p.ej. asignación) se obtiene con una
/// factoría configurada con su handler por defecto y su validador.
#[derive(Debug, Clone)]
pub struct StepFactory {
    step_type: StepType,
    handler: Arc<dyn Handler>,
    validator: Arc<dyn Validator>,
}

impl StepFactory {
    /// Factoría con el validador por defecto del tipo de step.
    pub fn new(step_type: StepType, handler: Arc<dyn Handler>) -> Self {
        let validator: Arc<dyn Validator> = match step_type {
            StepType::Assignment => Arc::new(AssignmentValidator::default()),
            StepType::Custom => Arc::new(BasicValidator::new(TargetPolicy::Default(DEFAULT_TARGET.to_string()))),
        };
        Self { step_type,
               handler,
               validator }
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn step_type(&self) -> StepType {
        self.step_type
    }

    /// Declaración validada. Los errores de parseo de argumentos y las
    /// violaciones estructurales salen como `DeclareTimeError`.
    pub fn declare(&self, args: Arguments) -> Result<Declaration, DeclareTimeError> {
        let captured = args.capture()?;
        let custom = args.custom_handler().cloned();
        let label = args.get_label().map(str::to_string).unwrap_or_else(|| self.step_type.as_str().to_string());
        let handler = custom.clone().unwrap_or_else(|| Arc::clone(&self.handler));

        debug!("declarando '{}' ({} argumentos, handler={})", label, captured.len(), handler.id());
        let created = Declaration::new(handler, captured, label, self.step_type, custom.is_some());
        let validated = self.validator.validate(&created)?;
        info!("step '{}' declarado [{}]: {}",
              validated.label(),
              validated.metadata().declaration_id,
              validated.fingerprint());
        Ok(validated)
    }

    /// Declara y liga en un solo paso.
    pub fn step(&self, args: Arguments) -> Result<Step, DeclareTimeError> {
        bind(self.declare(args)?)
    }

    /// Constructor de declaraciones listo para exponer como función pública.
    pub fn declare_step(&self) -> impl Fn(Arguments) -> Result<Declaration, DeclareTimeError> + Send + Sync + 'static {
        let factory = self.clone();
        move |args| factory.declare(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TARGET_PARAM;
    use crate::declaration::DeclarationState;
    use crate::testing::{recording_handler, table};
    use serde_json::json;

    #[test]
    fn label_defaults_to_step_type() {
        let factory = StepFactory::new(StepType::Custom, recording_handler());
        let decl = factory.declare(Arguments::new()).unwrap();
        assert_eq!(decl.label(), "custom");
        assert_eq!(decl.state(), DeclarationState::Validated);
        let decl = factory.declare(Arguments::new().label("mine")).unwrap();
        assert_eq!(decl.label(), "mine");
    }

    #[test]
    fn parse_error_surfaces_at_declare_time() {
        let factory = StepFactory::new(StepType::Custom, recording_handler());
        let err = factory.declare(Arguments::new().arg("offset", "(1")).unwrap_err();
        assert!(err.message.contains("`offset`"));
    }

    #[test]
    fn validator_can_require_target() {
        let factory = StepFactory::new(StepType::Custom, recording_handler()).with_validator(Arc::new(BasicValidator::new(TargetPolicy::Required)));
        let err = factory.declare(Arguments::new()).unwrap_err();
        assert_eq!(err.message, "Must provide assignment_variable.");
        assert!(factory.declare(Arguments::new().arg(TARGET_PARAM, "W")).is_ok());
    }

    #[test]
    fn declare_step_builds_reusable_constructor() {
        let declare = StepFactory::new(StepType::Custom, recording_handler()).declare_step();
        let decl = declare(Arguments::new().arg(TARGET_PARAM, "W").arg("offset", "1")).unwrap();
        let out = bind(decl).unwrap().apply(&table(2)).unwrap();
        assert_eq!(out.column("W").unwrap().to_vec(), vec![json!(1), json!(2)]);
    }
}
