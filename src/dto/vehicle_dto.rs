use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Driver, ServiceDetail, VehicleOverview};
use crate::utils::validation::{blank_as_none, present_uuid};

// Request para crear o actualizar un vehículo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRequest {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 100))]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 20))]
    pub plate_number: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 50))]
    pub vehicle_type: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i32>,
    #[serde(default, deserialize_with = "present_uuid")]
    pub assigned_driver_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDriverRequest {
    #[serde(default, deserialize_with = "present_uuid")]
    pub driver_id: Option<Option<Uuid>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// Response de vehículo
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: Uuid,
    pub model: String,
    pub plate_number: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub capacity: i32,
    pub assigned_driver: Option<String>,
    pub assigned_driver_id: Option<Uuid>,
    pub availability: String,
    pub total_bookings: i64,
    pub active_bookings: i64,
    pub completed_bookings: i64,
}

impl From<VehicleOverview> for VehicleResponse {
    fn from(row: VehicleOverview) -> Self {
        let assigned_driver = row.driver_name();
        let availability = row.availability().to_string();
        let vehicle = row.vehicle;
        Self {
            id: vehicle.id,
            model: vehicle.model,
            plate_number: vehicle.plate_number,
            vehicle_type: vehicle.vehicle_type,
            capacity: vehicle.capacity,
            assigned_driver,
            assigned_driver_id: vehicle.assigned_driver_id,
            availability,
            total_bookings: row.total_bookings,
            active_bookings: row.active_bookings,
            completed_bookings: row.completed_bookings,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDriverInfo {
    pub id: Uuid,
    pub model: String,
    pub plate_number: String,
    pub assigned_driver: Option<String>,
    pub assigned_driver_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AssignDriverResponse {
    pub message: String,
    pub vehicle: VehicleDriverInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDriver {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
}

impl From<Driver> for AvailableDriver {
    fn from(driver: Driver) -> Self {
        Self {
            full_name: driver.full_name(),
            id: driver.id,
            first_name: driver.first_name,
            last_name: driver.last_name,
            email: driver.email,
            phone: driver.phone,
            license_number: driver.license_number,
        }
    }
}

// Fila del calendario de un vehículo
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub service_type: String,
    pub booking_id: Uuid,
    pub booking_status: String,
    pub client_name: String,
    pub driver_info: Option<String>,
    pub notes: Option<String>,
}

impl From<&ServiceDetail> for ScheduleEntry {
    fn from(detail: &ServiceDetail) -> Self {
        let service = &detail.service;
        Self {
            id: service.id,
            title: service.service_name.clone(),
            start: service.start_date,
            end: service.end_date,
            start_time: service.start_time.map(|t| t.format("%H:%M").to_string()),
            end_time: service.end_time.map(|t| t.format("%H:%M").to_string()),
            service_type: service.service_type.clone(),
            booking_id: service.booking_id,
            booking_status: detail.booking_status.clone(),
            client_name: detail.client_name(),
            driver_info: detail.driver_name(),
            notes: service.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleScheduleResponse {
    pub vehicle_id: Uuid,
    pub vehicle_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub schedule: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSlot {
    pub id: Uuid,
    pub service_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub client_name: String,
}

impl From<&ServiceDetail> for BookingSlot {
    fn from(detail: &ServiceDetail) -> Self {
        Self {
            id: detail.service.id,
            service_name: detail.service.service_name.clone(),
            start_date: detail.service.start_date,
            end_date: detail.service.end_date,
            client_name: detail.client_name(),
        }
    }
}

// Estado actual de un vehículo (busy / scheduled / available)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatusEntry {
    pub id: Uuid,
    pub model: String,
    pub plate_number: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub capacity: i32,
    pub assigned_driver: Option<String>,
    pub status: String,
    pub current_booking: Option<BookingSlot>,
    pub next_booking: Option<BookingSlot>,
}
