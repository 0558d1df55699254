//! Steps públicos construidos sobre la `StepFactory` del core.
pub mod assignment;
