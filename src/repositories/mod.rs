//! Repositorios
//!
//! Acceso a PostgreSQL con SQLx, una estructura por tabla.

pub mod booking_repository;
pub mod client_repository;
pub mod company_repository;
pub mod dashboard_repository;
pub mod driver_repository;
pub mod invoice_repository;
pub mod notification_repository;
pub mod service_repository;
pub mod settings_repository;
pub mod vehicle_repository;
