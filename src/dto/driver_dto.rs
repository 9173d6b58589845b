use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Driver, Vehicle};
use crate::utils::validation::blank_as_none;

// Request para crear o actualizar un conductor
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DriverRequest {
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
    #[validate(length(max = 50))]
    pub license_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVehiclesRequest {
    #[serde(default)]
    pub vehicle_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedVehicle {
    pub id: Uuid,
    pub model: String,
    pub plate_number: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
}

impl From<&Vehicle> for AssignedVehicle {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id,
            model: vehicle.model.clone(),
            plate_number: vehicle.plate_number.clone(),
            vehicle_type: vehicle.vehicle_type.clone(),
        }
    }
}

// Response de conductor con su flota
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    pub assigned_vehicles: Vec<AssignedVehicle>,
}

impl DriverResponse {
    pub fn new(driver: Driver, vehicles: &[Vehicle]) -> Self {
        let assigned_vehicles = vehicles
            .iter()
            .filter(|v| v.assigned_driver_id == Some(driver.id))
            .map(AssignedVehicle::from)
            .collect();
        Self {
            id: driver.id,
            first_name: driver.first_name,
            last_name: driver.last_name,
            email: driver.email,
            phone: driver.phone,
            license_number: driver.license_number,
            assigned_vehicles,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVehiclesResponse {
    pub message: String,
    pub assigned_vehicles: Vec<AssignedVehicle>,
}
