//! Errores de la aplicación (binario y utilidades de réplica).
mod app_error;

pub use app_error::AppError;
