//! Steps: factoría genérica, runtime de aplicación y macro de argumentos.
pub mod factory;
pub mod macros;
pub mod runtime;

pub use factory::StepFactory;
pub use runtime::{bind, Step, StepFn};
