//! assignflow-rust: aplicación de ejemplo sobre `assign-core` y
//! `assign-adapters` (configuración, errores y réplicas en paralelo).
pub mod config;
pub mod errors;
pub mod replicates;

pub use assign_adapters::{declare_assignment, declare_assignment_with};
pub use assign_core::{bind, Arguments, DataTable, Step};
