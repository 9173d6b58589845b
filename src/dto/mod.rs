//! DTOs de request y response de la API

pub mod booking_dto;
pub mod client_dto;
pub mod common;
pub mod company_dto;
pub mod dashboard_dto;
pub mod driver_dto;
pub mod invoice_dto;
pub mod notification_dto;
pub mod settings_dto;
pub mod vehicle_dto;
