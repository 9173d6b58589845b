use chrono::{Datelike, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{
    AssignDriverResponse, AvailableDriver, BookingSlot, ScheduleEntry, ScheduleQuery, VehicleDriverInfo,
    VehicleRequest, VehicleResponse, VehicleScheduleResponse, VehicleStatusEntry,
};
use crate::models::{BookingStatus, ServiceDetail};
use crate::repositories::driver_repository::DriverRepository;
use crate::repositories::service_repository::ServiceRepository;
use crate::repositories::vehicle_repository::{VehicleFields, VehicleRepository};
use crate::utils::calendar::month_end;
use crate::utils::errors::{bad_request_error, internal_error, not_found_error, AppError, AppResult};
use crate::utils::validation::parse_date;

const REQUIRED_MESSAGE: &str = "Model, plate number, type, and capacity are required";
const SCHEDULE_STATUSES: [&str; 3] = ["pending", "confirmed", "completed"];

pub struct VehicleController {
    repository: VehicleRepository,
    drivers: DriverRepository,
    services: ServiceRepository,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool.clone()),
            drivers: DriverRepository::new(pool.clone()),
            services: ServiceRepository::new(pool),
        }
    }

    pub async fn list(&self) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self.repository.list().await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<VehicleResponse, AppError> {
        self.repository
            .find_overview(id)
            .await?
            .map(VehicleResponse::from)
            .ok_or_else(|| not_found_error("Vehicle"))
    }

    pub async fn create(&self, request: VehicleRequest) -> Result<VehicleResponse, AppError> {
        let driver_id = request.assigned_driver_id.flatten();
        let fields = self.validated_fields(request, None, driver_id).await?;
        let vehicle = self.repository.create(fields).await?;
        tracing::info!("🚗 Vehículo creado: {} ({})", vehicle.label(), vehicle.id);
        self.get_by_id(vehicle.id).await
    }

    pub async fn update(&self, id: Uuid, request: VehicleRequest) -> Result<VehicleResponse, AppError> {
        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))?;
        let driver_id = match request.assigned_driver_id {
            Some(requested) => requested,
            None => current.assigned_driver_id,
        };
        let fields = self.validated_fields(request, Some(id), driver_id).await?;
        self.repository
            .update(id, fields)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))?;
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Vehicle"));
        }
        let active = self.repository.count_active_services(id, &BookingStatus::ACTIVE).await?;
        if active > 0 {
            return Err(bad_request_error(format!(
                "Cannot delete vehicle with {} active bookings",
                active
            )));
        }
        self.repository.delete(id).await?;
        Ok(())
    }

    /// Asignar (o quitar con `None`) el conductor fijo del vehículo
    pub async fn assign_driver(&self, id: Uuid, driver_id: Option<Uuid>) -> Result<AssignDriverResponse, AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Vehicle"));
        }

        let driver_name = match driver_id {
            Some(driver_id) => {
                let driver = self
                    .drivers
                    .find_by_id(driver_id)
                    .await?
                    .ok_or_else(|| not_found_error("Driver"))?;
                if let Some(other) = self.repository.find_by_driver(driver_id, id).await? {
                    return Err(bad_request_error(format!(
                        "Driver is already assigned to vehicle {} ({})",
                        other.model, other.plate_number
                    )));
                }
                Some(driver.full_name())
            }
            None => None,
        };

        let vehicle = self
            .repository
            .set_driver(id, driver_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))?;
        tracing::info!("🔗 Vehículo {} -> conductor {:?}", vehicle.label(), driver_id);

        Ok(AssignDriverResponse {
            message: "Driver assignment updated successfully".to_string(),
            vehicle: VehicleDriverInfo {
                id: vehicle.id,
                model: vehicle.model,
                plate_number: vehicle.plate_number,
                assigned_driver: driver_name,
                assigned_driver_id: vehicle.assigned_driver_id,
            },
        })
    }

    pub async fn available_drivers(&self) -> Result<Vec<AvailableDriver>, AppError> {
        let drivers = self.drivers.list_unassigned().await?;
        Ok(drivers.into_iter().map(AvailableDriver::from).collect())
    }

    /// Calendario del vehículo; por defecto el mes en curso
    pub async fn schedule(&self, id: Uuid, query: ScheduleQuery) -> Result<VehicleScheduleResponse, AppError> {
        let vehicle = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))?;
        let (start_date, end_date) = schedule_window(&query, Utc::now().date_naive())?;

        let details = self
            .services
            .details_for_vehicle_between(id, start_date, end_date, &SCHEDULE_STATUSES)
            .await?;

        Ok(VehicleScheduleResponse {
            vehicle_id: vehicle.id,
            vehicle_name: vehicle.label(),
            start_date,
            end_date,
            schedule: details.iter().map(ScheduleEntry::from).collect(),
        })
    }

    /// Estado de cada vehículo respecto a hoy
    pub async fn status(&self) -> Result<Vec<VehicleStatusEntry>, AppError> {
        let today = Utc::now().date_naive();
        let vehicles = self.repository.list().await?;
        let details = self
            .services
            .vehicle_details_from(today, &BookingStatus::ACTIVE)
            .await?;

        Ok(vehicles
            .into_iter()
            .map(|row| {
                let own: Vec<&ServiceDetail> = details
                    .iter()
                    .filter(|d| d.service.vehicle_id == Some(row.vehicle.id))
                    .collect();
                let (status, current, next) = classify_vehicle(&own, today);
                let assigned_driver = row.driver_name();
                let vehicle = row.vehicle;
                VehicleStatusEntry {
                    id: vehicle.id,
                    model: vehicle.model,
                    plate_number: vehicle.plate_number,
                    vehicle_type: vehicle.vehicle_type,
                    capacity: vehicle.capacity,
                    assigned_driver,
                    status: status.to_string(),
                    current_booking: current,
                    next_booking: next,
                }
            })
            .collect())
    }

    async fn validated_fields(
        &self,
        request: VehicleRequest,
        exclude_id: Option<Uuid>,
        assigned_driver_id: Option<Uuid>,
    ) -> Result<VehicleFields, AppError> {
        let (Some(model), Some(plate_number), Some(vehicle_type), Some(capacity)) = (
            request.model.clone(),
            request.plate_number.clone(),
            request.vehicle_type.clone(),
            request.capacity.filter(|c| *c != 0),
        ) else {
            return Err(bad_request_error(REQUIRED_MESSAGE));
        };
        request.validate()?;

        if self.repository.plate_exists(&plate_number, exclude_id).await? {
            return Err(bad_request_error("Plate number already exists"));
        }
        if let Some(driver_id) = assigned_driver_id {
            if self.drivers.find_by_id(driver_id).await?.is_none() {
                return Err(not_found_error("Driver"));
            }
        }

        Ok(VehicleFields {
            model,
            plate_number,
            vehicle_type,
            capacity,
            assigned_driver_id,
        })
    }
}

/// Ventana `[start, end]`: sin inicio empieza el mes de `today`; sin fin acaba el mes del inicio
fn schedule_window(query: &ScheduleQuery, today: NaiveDate) -> AppResult<(NaiveDate, NaiveDate)> {
    const MESSAGE: &str = "Invalid date format. Use YYYY-MM-DD";

    let start = match query.start_date.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_date(raw, MESSAGE)?,
        None => today.with_day(1).ok_or_else(|| internal_error("Invalid calendar date"))?,
    };
    let end = match query.end_date.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_date(raw, MESSAGE)?,
        None => month_end(start.year(), start.month()).ok_or_else(|| internal_error("Invalid calendar date"))?,
    };

    Ok((start, end))
}

/// `busy` si un servicio cubre `today`, `scheduled` si hay uno futuro, si no `available`
fn classify_vehicle(
    services: &[&ServiceDetail],
    today: NaiveDate,
) -> (&'static str, Option<BookingSlot>, Option<BookingSlot>) {
    let current = services
        .iter()
        .find(|d| d.service.start_date <= today && d.service.end_date >= today)
        .map(|d| BookingSlot::from(*d));
    let next = services
        .iter()
        .filter(|d| d.service.start_date > today)
        .min_by_key(|d| d.service.start_date)
        .map(|d| BookingSlot::from(*d));

    let status = if current.is_some() {
        "busy"
    } else if next.is_some() {
        "scheduled"
    } else {
        "available"
    };

    (status, current, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::fixtures::{detail, service};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rental(start: NaiveDate, end: NaiveDate) -> ServiceDetail {
        let mut s = service("Vehicle");
        s.start_date = start;
        s.end_date = end;
        detail(s, Uuid::new_v4(), "Mehmet Yilmaz")
    }

    #[test]
    fn test_schedule_window_defaults_to_current_month() {
        let (start, end) = schedule_window(&ScheduleQuery::default(), date(2024, 2, 14)).unwrap();
        assert_eq!(start, date(2024, 2, 1));
        assert_eq!(end, date(2024, 2, 29));
    }

    #[test]
    fn test_schedule_window_end_follows_given_start() {
        let query = ScheduleQuery {
            start_date: Some("2024-12-05".to_string()),
            end_date: None,
        };
        let (start, end) = schedule_window(&query, date(2024, 2, 14)).unwrap();
        assert_eq!(start, date(2024, 12, 5));
        assert_eq!(end, date(2024, 12, 31));

        let bad = ScheduleQuery {
            start_date: Some("05.12.2024".to_string()),
            end_date: None,
        };
        assert!(schedule_window(&bad, date(2024, 2, 14)).is_err());
    }

    #[test]
    fn test_vehicle_busy_today() {
        let today = date(2024, 5, 10);
        let running = rental(date(2024, 5, 9), date(2024, 5, 11));
        let later = rental(date(2024, 5, 20), date(2024, 5, 21));
        let (status, current, next) = classify_vehicle(&[&running, &later], today);
        assert_eq!(status, "busy");
        assert_eq!(current.unwrap().id, running.service.id);
        assert_eq!(next.unwrap().id, later.service.id);
    }

    #[test]
    fn test_vehicle_scheduled_picks_earliest_future() {
        let today = date(2024, 5, 10);
        let far = rental(date(2024, 6, 1), date(2024, 6, 2));
        let soon = rental(date(2024, 5, 12), date(2024, 5, 12));
        let (status, current, next) = classify_vehicle(&[&far, &soon], today);
        assert_eq!(status, "scheduled");
        assert!(current.is_none());
        assert_eq!(next.unwrap().client_name, "Mehmet Yilmaz");
    }

    #[test]
    fn test_vehicle_available_without_services() {
        let (status, current, next) = classify_vehicle(&[], date(2024, 5, 10));
        assert_eq!(status, "available");
        assert!(current.is_none() && next.is_none());
    }
}
