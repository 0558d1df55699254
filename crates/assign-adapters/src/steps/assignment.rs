//! Step de asignación.
//!
//! `declare_assignment(args)` captura los argumentos sin evaluarlos, valida
//! la declaración (nombres de bloque/cluster desnudos, variables objetivo,
//! factoring de la parte pura) y devuelve una `Declaration` lista para
//! `assign_core::bind`.

use std::sync::Arc;

use assign_core::{Arguments, AssignmentHandler, Declaration, DeclareTimeError, Handler, StepFactory, StepType};

use crate::randomizer::StandardRandomizer;

/// Factoría del step de asignación con `StandardRandomizer`.
pub fn assignment_factory() -> StepFactory {
    StepFactory::new(StepType::Assignment, Arc::new(AssignmentHandler::new(Arc::new(StandardRandomizer::new()))))
}

pub fn declare_assignment(args: Arguments) -> Result<Declaration, DeclareTimeError> {
    assignment_factory().declare(args)
}

/// Igual que `declare_assignment` pero con un handler propio. Sin factoring.
pub fn declare_assignment_with(args: Arguments, handler: Arc<dyn Handler>) -> Result<Declaration, DeclareTimeError> {
    assignment_factory().declare(args.handler(handler))
}
