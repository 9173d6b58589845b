use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{ClientSummary, ServiceDetail};
use crate::utils::validation::{blank_as_none, blank_as_none_uuid};

// Request para crear o actualizar un cliente
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub passport_number: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub license_number: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none_uuid")]
    pub company_id: Option<Uuid>,
}

// Request para registrar un pago
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub paid_amount: Decimal,
    pub payment_status: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub payment_date: Option<String>,
}

// Response de cliente
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub passport_number: Option<String>,
    pub license_number: Option<String>,
    pub address: Option<String>,
    pub company: String,
    pub company_id: Option<Uuid>,
    pub booking_count: i64,
    pub paid_amount: Decimal,
    pub payment_status: String,
    pub payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<ClientSummary> for ClientResponse {
    fn from(summary: ClientSummary) -> Self {
        let client = summary.client;
        Self {
            id: client.id,
            first_name: client.first_name,
            last_name: client.last_name,
            email: client.email,
            phone: client.phone,
            passport_number: client.passport_number,
            license_number: client.license_number,
            address: client.address,
            company: summary.company_name.unwrap_or_else(|| "No Company".to_string()),
            company_id: client.company_id,
            booking_count: summary.booking_count,
            paid_amount: client.paid_amount,
            payment_status: client.payment_status,
            payment_date: client.payment_date,
            created_at: client.created_at,
        }
    }
}

// Cabecera del cliente en el historial de reservas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientHeader {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: String,
}

// Servicio del historial de reservas de un cliente
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientServiceEntry {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub service_type: String,
    pub service_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost: Decimal,
    pub total_selling_price: Decimal,
    pub profit: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub driver_name: Option<String>,
    pub vehicle_info: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_nights: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_night: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_price_per_night: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(rename = "is_hourly", skip_serializing_if = "Option::is_none")]
    pub is_hourly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<Decimal>,
    #[serde(rename = "with_driver", skip_serializing_if = "Option::is_none")]
    pub with_driver: Option<bool>,
}

impl From<&ServiceDetail> for ClientServiceEntry {
    fn from(detail: &ServiceDetail) -> Self {
        let service = &detail.service;
        let accommodation = service.is_accommodation();
        let rental = service.is_vehicle_rental();
        let tour = service.is_tour();
        Self {
            id: service.id,
            booking_id: service.booking_id,
            service_type: service.service_type.clone(),
            service_name: service.service_name.clone(),
            start_date: service.start_date,
            end_date: service.end_date,
            total_cost: service.total_cost(),
            total_selling_price: service.total_selling_price(),
            profit: service.profit(),
            status: detail.booking_status.clone(),
            notes: service.notes.clone(),
            driver_name: detail.driver_name(),
            vehicle_info: detail.vehicle_info(),
            created_at: detail.booking_created_at,
            hotel_name: service.hotel_name.clone().filter(|_| accommodation),
            room_type: service.room_type.clone().filter(|_| accommodation),
            num_nights: service.num_nights.filter(|_| accommodation),
            cost_per_night: accommodation.then(|| service.cost_per_night.unwrap_or_default()),
            selling_price_per_night: accommodation
                .then(|| service.selling_price_per_night.unwrap_or_default()),
            start_time: service
                .start_time
                .filter(|_| tour)
                .map(|t| t.format("%H:%M").to_string()),
            end_time: service
                .end_time
                .filter(|_| tour)
                .map(|t| t.format("%H:%M").to_string()),
            is_hourly: rental.then_some(service.is_hourly),
            hours: service.hours.filter(|_| rental),
            with_driver: service.with_driver.filter(|_| rental),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ClientBookingGroups {
    pub hotels: Vec<ClientServiceEntry>,
    pub tours: Vec<ClientServiceEntry>,
    pub vehicle_rentals: Vec<ClientServiceEntry>,
}

// Response del historial de reservas de un cliente
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBookingsResponse {
    pub client: ClientHeader,
    pub bookings: ClientBookingGroups,
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
}
