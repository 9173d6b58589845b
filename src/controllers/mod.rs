//! Controladores
//!
//! Lógica de cada recurso sobre los repositorios. Las rutas sólo extraen
//! parámetros y delegan aquí.

pub mod booking_controller;
pub mod client_controller;
pub mod company_controller;
pub mod dashboard_controller;
pub mod driver_controller;
pub mod invoice_controller;
pub mod notification_controller;
pub mod settings_controller;
pub mod vehicle_controller;
