//! Back office de la agencia de turismo
//!
//! API HTTP sobre PostgreSQL: clientes, empresas, conductores, vehículos,
//! reservas con sus servicios, facturas, notificaciones y ajustes.

pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{middleware::from_fn_with_state, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{cors_layer, rate_limit_middleware, RateLimitState};
use crate::state::AppState;

/// Router completo de la aplicación
pub fn build_app(state: AppState) -> Router {
    let rate_limit = RateLimitState::new(&state.config);
    let cors = cors_layer(&state.config);

    let api = Router::new()
        .nest("/clients", routes::client_routes::create_client_router())
        .nest("/companies", routes::company_routes::create_company_router())
        .nest("/drivers", routes::driver_routes::create_driver_router())
        .nest("/vehicles", routes::vehicle_routes::create_vehicle_router())
        .nest("/bookings", routes::booking_routes::create_booking_router())
        .nest("/invoices", routes::invoice_routes::create_invoice_router())
        .nest("/notifications", routes::notification_routes::create_notification_router())
        .nest("/settings", routes::settings_routes::create_settings_router())
        .nest("/dashboard", routes::dashboard_routes::create_dashboard_router())
        .layer(from_fn_with_state(rate_limit, rate_limit_middleware));

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn welcome() -> &'static str {
    "Welcome to the Tourism Back Office API!"
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tourism_backoffice",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
