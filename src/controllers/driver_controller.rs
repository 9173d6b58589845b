use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::driver_dto::{AssignVehiclesResponse, AssignedVehicle, DriverRequest, DriverResponse};
use crate::models::{BookingStatus, Vehicle};
use crate::repositories::driver_repository::{DriverFields, DriverRepository};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{bad_request_error, not_found_error, AppError};

const REQUIRED_MESSAGE: &str = "First name, last name, email, and license number are required";

/// Un vehículo de otro conductor bloquea la asignación
pub fn check_vehicle_availability(driver_id: Uuid, requested: &[Vehicle]) -> Result<(), AppError> {
    match requested
        .iter()
        .find(|v| v.assigned_driver_id.is_some_and(|owner| owner != driver_id))
    {
        Some(taken) => Err(bad_request_error(format!(
            "Vehicle {} is already assigned to another driver",
            taken.label()
        ))),
        None => Ok(()),
    }
}

pub struct DriverController {
    repository: DriverRepository,
    vehicles: VehicleRepository,
}

impl DriverController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DriverRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool),
        }
    }

    pub async fn list(&self) -> Result<Vec<DriverResponse>, AppError> {
        let drivers = self.repository.list().await?;
        let ids: Vec<Uuid> = drivers.iter().map(|d| d.id).collect();
        let vehicles = self.repository.vehicles_of(&ids).await?;

        Ok(drivers
            .into_iter()
            .map(|driver| DriverResponse::new(driver, &vehicles))
            .collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<DriverResponse, AppError> {
        let driver = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Driver"))?;
        let vehicles = self.repository.vehicles_of(&[id]).await?;
        Ok(DriverResponse::new(driver, &vehicles))
    }

    pub async fn create(&self, request: DriverRequest) -> Result<DriverResponse, AppError> {
        let fields = self.validated_fields(request, None).await?;
        let driver = self.repository.create(fields).await?;
        tracing::info!("🚐 Conductor creado: {} ({})", driver.full_name(), driver.id);
        Ok(DriverResponse::new(driver, &[]))
    }

    pub async fn update(&self, id: Uuid, request: DriverRequest) -> Result<DriverResponse, AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Driver"));
        }
        let fields = self.validated_fields(request, Some(id)).await?;
        self.repository
            .update(id, fields)
            .await?
            .ok_or_else(|| not_found_error("Driver"))?;
        self.get_by_id(id).await
    }

    /// Sustituir los vehículos asignados al conductor
    pub async fn assign_vehicles(&self, id: Uuid, vehicle_ids: Vec<Uuid>) -> Result<AssignVehiclesResponse, AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Driver"));
        }

        let requested = self.vehicles.find_by_ids(&vehicle_ids).await?;
        check_vehicle_availability(id, &requested)?;

        let assigned = self.repository.replace_vehicles(id, &vehicle_ids).await?;
        tracing::info!("🔗 Conductor {} con {} vehículos asignados", id, assigned.len());

        Ok(AssignVehiclesResponse {
            message: "Vehicle assignment updated successfully".to_string(),
            assigned_vehicles: assigned.iter().map(AssignedVehicle::from).collect(),
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Driver"));
        }
        let active = self.repository.count_active_services(id, &BookingStatus::ACTIVE).await?;
        if active > 0 {
            return Err(bad_request_error(format!(
                "Cannot delete driver with {} active bookings",
                active
            )));
        }
        self.repository.delete(id).await?;
        Ok(())
    }

    async fn validated_fields(&self, request: DriverRequest, exclude_id: Option<Uuid>) -> Result<DriverFields, AppError> {
        let (Some(first_name), Some(last_name), Some(email), Some(license_number)) = (
            request.first_name.clone(),
            request.last_name.clone(),
            request.email.clone(),
            request.license_number.clone(),
        ) else {
            return Err(bad_request_error(REQUIRED_MESSAGE));
        };
        request.validate()?;

        if self.repository.email_exists(&email, exclude_id).await? {
            return Err(bad_request_error("Email already exists"));
        }
        if self.repository.license_exists(&license_number, exclude_id).await? {
            return Err(bad_request_error("License number already exists"));
        }

        Ok(DriverFields {
            first_name,
            last_name,
            email,
            phone: request.phone.unwrap_or_default(),
            license_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn vehicle(plate: &str, owner: Option<Uuid>) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            model: "Mercedes Vito".to_string(),
            plate_number: plate.to_string(),
            vehicle_type: "Van".to_string(),
            capacity: 8,
            assigned_driver_id: owner,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_own_and_free_vehicles_can_be_assigned() {
        let driver_id = Uuid::new_v4();
        let requested = vec![vehicle("34 ABC 12", Some(driver_id)), vehicle("34 XYZ 99", None)];
        assert!(check_vehicle_availability(driver_id, &requested).is_ok());
        assert!(check_vehicle_availability(driver_id, &[]).is_ok());
    }

    #[test]
    fn test_vehicle_of_another_driver_is_rejected() {
        let driver_id = Uuid::new_v4();
        let requested = vec![vehicle("34 ABC 12", None), vehicle("06 DEF 45", Some(Uuid::new_v4()))];

        let err = check_vehicle_availability(driver_id, &requested).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Bad request: Vehicle Mercedes Vito - 06 DEF 45 is already assigned to another driver"
        );
    }
}
