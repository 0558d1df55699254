//! assign-core: declaración diferida y validada de steps de asignación.
//!
//! Un step se declara con argumentos sin evaluar, se valida antes de ver
//! datos (chequeos estructurales y factoring de la parte pura) y se liga en
//! una función `tabla -> tabla` que puede aplicarse muchas veces. La
//! matemática de aleatorización queda fuera: la aporta un `Randomizer`.
pub mod constants;
pub mod declaration;
pub mod errors;
pub mod expr;
pub mod handler;
pub mod hashing;
pub mod model;
pub mod scheme;
pub mod step;
pub mod validate;

#[cfg(test)]
mod testing;

pub use declaration::{Arguments, CapturedArg, Declaration, DeclarationArtifact, DeclarationMetadata, DeclarationState, StepType};
pub use errors::{DeclareTimeError, ParseError, RuntimeEvaluationError, SchemeError, StepError, TableError};
pub use expr::{ArgShape, DeferredExpr, Env, EvalContext};
pub use handler::{AssignmentHandler, Handler, HandlerArgs};
pub use model::DataTable;
pub use scheme::{AssignmentScheme, Randomizer, SchemeRequest};
pub use step::{bind, Step, StepFactory, StepFn};
pub use validate::{AssignmentValidator, BasicValidator, TargetPolicy, Validator};
