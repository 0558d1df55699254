//! assign-adapters: capacidad de aleatorización concreta y steps públicos.
//!
//! Este crate provee:
//! - `StandardRandomizer`: esquemas completos o simples, con bloques y
//!   clusters, sobre condiciones binarias o multi-brazo.
//! - `declare_assignment` / `declare_assignment_with`: constructores del
//!   step de asignación sobre la `StepFactory` del core.
//!
//! El core no conoce la matemática de asignación; todo lo que sigue se
//! conecta a él sólo a través de los traits `Randomizer` y `AssignmentScheme`.

pub mod params;
pub mod randomizer;
pub mod scheme;
pub mod steps;

pub use randomizer::StandardRandomizer;
pub use scheme::StratifiedScheme;
pub use steps::assignment::{assignment_factory, declare_assignment, declare_assignment_with};
