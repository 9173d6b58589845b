pub mod booking_routes;
pub mod client_routes;
pub mod company_routes;
pub mod dashboard_routes;
pub mod driver_routes;
pub mod invoice_routes;
pub mod notification_routes;
pub mod settings_routes;
pub mod vehicle_routes;
