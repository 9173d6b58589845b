//! Modelo de Vehicle
//!
//! Vehículos de la flota, con un conductor asignado opcional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub model: String,
    pub plate_number: String,
    #[sqlx(rename = "type")]
    pub vehicle_type: String,
    pub capacity: i32,
    pub assigned_driver_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// "Modelo - Matrícula"
    pub fn label(&self) -> String {
        format!("{} - {}", self.model, self.plate_number)
    }
}

/// Vehículo con su conductor y contadores de servicios
#[derive(Debug, Clone, FromRow)]
pub struct VehicleOverview {
    #[sqlx(flatten)]
    pub vehicle: Vehicle,
    pub driver_first_name: Option<String>,
    pub driver_last_name: Option<String>,
    pub total_bookings: i64,
    pub active_bookings: i64,
    pub completed_bookings: i64,
}

impl VehicleOverview {
    pub fn driver_name(&self) -> Option<String> {
        match (&self.driver_first_name, &self.driver_last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        }
    }

    pub fn availability(&self) -> &'static str {
        if self.active_bookings > 0 {
            "Booked"
        } else {
            "Available"
        }
    }
}
