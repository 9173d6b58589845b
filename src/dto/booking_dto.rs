use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{BookingTotals, BookingWithClient, Service};
use crate::utils::validation::{blank_as_none, blank_as_none_uuid};

// Request para crear o reemplazar una reserva con sus servicios
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default, deserialize_with = "blank_as_none_uuid")]
    pub client_id: Option<Uuid>,
    #[serde(default, alias = "overall_startDate", deserialize_with = "blank_as_none")]
    pub overall_start_date: Option<String>,
    #[serde(default, alias = "overall_endDate", deserialize_with = "blank_as_none")]
    pub overall_end_date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub services: Option<Vec<ServicePayload>>,
}

// Servicio tal como llega del formulario; los importes aceptan número o texto
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub service_type: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub service_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none_uuid")]
    pub driver_id: Option<Uuid>,
    #[serde(default, deserialize_with = "blank_as_none_uuid")]
    pub vehicle_id: Option<Uuid>,
    pub cost_to_company: Option<Value>,
    pub selling_price: Option<Value>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub hotel_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub hotel_city: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub room_type: Option<String>,
    pub num_nights: Option<Value>,
    pub cost_per_night: Option<Value>,
    pub selling_price_per_night: Option<Value>,
    #[serde(default, alias = "is_hourly")]
    pub is_hourly: Option<bool>,
    pub hours: Option<Value>,
    #[serde(default, alias = "with_driver")]
    pub with_driver: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    pub message: String,
    pub id: Uuid,
}

// Servicio con sus campos calculados
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: Uuid,
    pub service_type: String,
    pub service_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub cost_to_company: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub hotel_name: Option<String>,
    pub hotel_city: Option<String>,
    pub room_type: Option<String>,
    pub num_nights: Option<i32>,
    pub cost_per_night: Option<Decimal>,
    pub selling_price_per_night: Option<Decimal>,
    #[serde(rename = "is_hourly")]
    pub is_hourly: bool,
    pub hours: Option<Decimal>,
    #[serde(rename = "with_driver")]
    pub with_driver: Option<bool>,
    pub is_accommodation: bool,
    pub is_tour: bool,
    pub is_vehicle_rental: bool,
    pub total_cost: Decimal,
    pub total_selling_price: Decimal,
    pub profit: Decimal,
}

impl From<&Service> for ServiceResponse {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id,
            service_type: service.service_type.clone(),
            service_name: service.service_name.clone(),
            start_date: service.start_date,
            end_date: service.end_date,
            start_time: service.start_time.map(|t| t.format("%H:%M").to_string()),
            end_time: service.end_time.map(|t| t.format("%H:%M").to_string()),
            notes: service.notes.clone(),
            driver_id: service.driver_id,
            vehicle_id: service.vehicle_id,
            cost_to_company: service.cost_to_company,
            selling_price: service.selling_price,
            hotel_name: service.hotel_name.clone(),
            hotel_city: service.hotel_city.clone(),
            room_type: service.room_type.clone(),
            num_nights: service.num_nights,
            cost_per_night: service.cost_per_night,
            selling_price_per_night: service.selling_price_per_night,
            is_hourly: service.is_hourly,
            hours: service.hours,
            with_driver: service.with_driver,
            is_accommodation: service.is_accommodation(),
            is_tour: service.is_tour(),
            is_vehicle_rental: service.is_vehicle_rental(),
            total_cost: service.total_cost(),
            total_selling_price: service.total_selling_price(),
            profit: service.profit(),
        }
    }
}

// Response de reserva; las fechas generales conservan la clave histórica del frontend
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client: String,
    #[serde(rename = "overall_startDate")]
    pub overall_start_date: NaiveDate,
    #[serde(rename = "overall_endDate")]
    pub overall_end_date: NaiveDate,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub services: Vec<ServiceResponse>,
    #[serde(flatten)]
    pub totals: BookingTotals,
}

impl BookingResponse {
    pub fn new(row: &BookingWithClient, services: &[&Service]) -> Self {
        let booking = &row.booking;
        Self {
            id: booking.id,
            client_id: booking.client_id,
            client: row.client_name(),
            overall_start_date: booking.overall_start_date,
            overall_end_date: booking.overall_end_date,
            notes: booking.notes.clone(),
            status: booking.status.clone(),
            created_at: booking.created_at,
            services: services.iter().map(|s| ServiceResponse::from(*s)).collect(),
            totals: BookingTotals::of(services.iter().copied()),
        }
    }
}
