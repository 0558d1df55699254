//! Modelos neutrales: la tabla de datos sobre la que operan los steps.

pub mod table;

pub use table::{Column, DataTable};
