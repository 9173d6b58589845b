//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y cálculo de periodos de calendario.

pub mod calendar;
pub mod errors;
pub mod validation;

pub use errors::{AppError, AppResult};
