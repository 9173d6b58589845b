use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::booking_dto::{BookingRequest, BookingResponse, ServicePayload};
use crate::models::{BookingStatus, BookingWithClient, NewBooking, NewService, Service, ServiceType};
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::client_repository::ClientRepository;
use crate::repositories::service_repository::ServiceRepository;
use crate::utils::errors::{bad_request_error, not_found_error, AppError, AppResult};
use crate::utils::validation::{parse_date, parse_time};

pub struct BookingController {
    repository: BookingRepository,
    clients: ClientRepository,
    services: ServiceRepository,
}

impl BookingController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BookingRepository::new(pool.clone()),
            clients: ClientRepository::new(pool.clone()),
            services: ServiceRepository::new(pool),
        }
    }

    pub async fn list(&self) -> Result<Vec<BookingResponse>, AppError> {
        let bookings = self.repository.list().await?;
        self.with_services(&bookings).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<BookingResponse, AppError> {
        let booking = self
            .repository
            .find_with_client(id)
            .await?
            .ok_or_else(|| not_found_error("Booking"))?;
        let mut responses = self.with_services(std::slice::from_ref(&booking)).await?;
        responses.pop().ok_or_else(|| not_found_error("Booking"))
    }

    pub async fn create(&self, request: BookingRequest) -> Result<Uuid, AppError> {
        let (booking, services) = validate_booking_payload(&request)?;
        self.ensure_client(booking.client_id).await?;

        let created = self.repository.create(&booking, &services).await?;
        tracing::info!("📋 Reserva creada: {} con {} servicios", created.id, services.len());
        Ok(created.id)
    }

    pub async fn update(&self, id: Uuid, request: BookingRequest) -> Result<(), AppError> {
        if !self.repository.exists(id).await? {
            return Err(not_found_error("Booking"));
        }
        let (booking, services) = validate_booking_payload(&request)?;
        self.ensure_client(booking.client_id).await?;

        self.repository
            .replace(id, &booking, &services)
            .await?
            .ok_or_else(|| not_found_error("Booking"))?;
        tracing::info!("✏️ Reserva actualizada: {}", id);
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repository.delete(id).await? {
            return Err(not_found_error("Booking"));
        }
        Ok(())
    }

    async fn ensure_client(&self, client_id: Uuid) -> Result<(), AppError> {
        if self.clients.find_by_id(client_id).await?.is_none() {
            return Err(not_found_error("Client"));
        }
        Ok(())
    }

    async fn with_services(&self, bookings: &[BookingWithClient]) -> Result<Vec<BookingResponse>, AppError> {
        let ids: Vec<Uuid> = bookings.iter().map(|b| b.booking.id).collect();
        let services = self.services.find_by_bookings(&ids).await?;

        let mut by_booking: HashMap<Uuid, Vec<&Service>> = HashMap::new();
        for service in &services {
            by_booking.entry(service.booking_id).or_default().push(service);
        }

        Ok(bookings
            .iter()
            .map(|row| {
                let own = by_booking.get(&row.booking.id).map(Vec::as_slice).unwrap_or(&[]);
                BookingResponse::new(row, own)
            })
            .collect())
    }
}

/// Validar el formulario de reserva y normalizar sus servicios
pub fn validate_booking_payload(request: &BookingRequest) -> AppResult<(NewBooking, Vec<NewService>)> {
    let client_id = request.client_id.ok_or_else(|| bad_request_error("clientId is required"))?;
    let start_raw = request
        .overall_start_date
        .as_deref()
        .ok_or_else(|| bad_request_error("overall_startDate is required"))?;
    let end_raw = request
        .overall_end_date
        .as_deref()
        .ok_or_else(|| bad_request_error("overall_endDate is required"))?;
    let payloads = request
        .services
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request_error("services is required"))?;

    const DATES_MESSAGE: &str = "Invalid date format for overall dates. Use YYYY-MM-DD";
    let overall_start_date = parse_date(start_raw, DATES_MESSAGE)?;
    let overall_end_date = parse_date(end_raw, DATES_MESSAGE)?;
    if overall_end_date < overall_start_date {
        return Err(bad_request_error("Overall end date must be after overall start date"));
    }

    let status = match request.status.as_deref() {
        Some(raw) => BookingStatus::from_str(raw).map_err(|_| {
            bad_request_error("Invalid booking status. Must be one of: pending, confirmed, completed, cancelled")
        })?,
        None => BookingStatus::default(),
    };

    let services = payloads.iter().map(validate_service).collect::<AppResult<Vec<_>>>()?;

    Ok((
        NewBooking {
            client_id,
            overall_start_date,
            overall_end_date,
            notes: request.notes.clone(),
            status,
        },
        services,
    ))
}

fn validate_service(payload: &ServicePayload) -> AppResult<NewService> {
    let required = |value: &Option<String>, field: &str| -> AppResult<String> {
        value
            .clone()
            .ok_or_else(|| bad_request_error(format!("Service {} is required", field)))
    };
    let type_raw = required(&payload.service_type, "serviceType")?;
    let service_name = required(&payload.service_name, "serviceName")?;
    let start_raw = required(&payload.start_date, "startDate")?;
    let end_raw = required(&payload.end_date, "endDate")?;

    const DATES_MESSAGE: &str = "Invalid date format for service dates. Use YYYY-MM-DD";
    let start_date = parse_date(&start_raw, DATES_MESSAGE)?;
    let end_date = parse_date(&end_raw, DATES_MESSAGE)?;
    if end_date < start_date {
        return Err(bad_request_error("Service end date must be after service start date"));
    }

    let service_type = ServiceType::from_str(&type_raw).map_err(|_| {
        bad_request_error(format!(
            "Invalid service type: {}. Must be one of: Hotel, Cabin, Tour, Vehicle",
            type_raw
        ))
    })?;

    let mut service = NewService {
        service_type,
        service_name,
        start_date,
        end_date,
        start_time: None,
        end_time: None,
        driver_id: payload.driver_id,
        vehicle_id: payload.vehicle_id,
        cost_to_company: None,
        selling_price: None,
        hotel_name: None,
        hotel_city: None,
        room_type: None,
        num_nights: None,
        cost_per_night: None,
        selling_price_per_night: None,
        is_hourly: false,
        hours: None,
        with_driver: None,
        notes: payload.notes.clone(),
    };

    match service_type {
        ServiceType::Tour => {
            service.start_time = payload
                .start_time
                .as_deref()
                .map(|t| parse_time(t, "Invalid start time format. Use HH:MM"))
                .transpose()?;
            service.end_time = payload
                .end_time
                .as_deref()
                .map(|t| parse_time(t, "Invalid end time format. Use HH:MM"))
                .transpose()?;
        }
        ServiceType::Vehicle => {
            service.is_hourly = payload.is_hourly.unwrap_or(false);
            service.hours = decimal_value(&payload.hours).map_err(|_| bad_request_error("Invalid hours value"))?;
            service.with_driver = payload.with_driver;
        }
        ServiceType::Hotel | ServiceType::Cabin => {}
    }

    if service_type.is_accommodation() {
        fill_accommodation(payload, &mut service)?;
    } else {
        fill_flat_prices(payload, &mut service)?;
    }

    Ok(service)
}

fn fill_accommodation(payload: &ServicePayload, service: &mut NewService) -> AppResult<()> {
    let missing = |field: &str| bad_request_error(format!("Service {} is required for accommodation bookings", field));
    let invalid = || bad_request_error("Invalid numeric values for accommodation");

    let hotel_name = payload.hotel_name.clone().ok_or_else(|| missing("hotelName"))?;
    let hotel_city = payload.hotel_city.clone().ok_or_else(|| missing("hotelCity"))?;
    let room_type = payload.room_type.clone().ok_or_else(|| missing("roomType"))?;
    let nights = decimal_value(&payload.num_nights)
        .map_err(|_| invalid())?
        .ok_or_else(|| missing("numNights"))?;
    let cost_per_night = decimal_value(&payload.cost_per_night)
        .map_err(|_| invalid())?
        .ok_or_else(|| missing("costPerNight"))?;
    let selling_per_night = decimal_value(&payload.selling_price_per_night)
        .map_err(|_| invalid())?
        .ok_or_else(|| missing("sellingPricePerNight"))?;

    if !nights.fract().is_zero() {
        return Err(invalid());
    }
    let num_nights = nights.to_i32().ok_or_else(invalid)?;
    if num_nights <= 0 || cost_per_night.is_sign_negative() || selling_per_night.is_sign_negative() {
        return Err(bad_request_error("Numeric values for accommodation must be positive"));
    }

    service.hotel_name = Some(hotel_name);
    service.hotel_city = Some(hotel_city);
    service.room_type = Some(room_type);
    service.num_nights = Some(num_nights);
    service.cost_per_night = Some(cost_per_night);
    service.selling_price_per_night = Some(selling_per_night);
    Ok(())
}

fn fill_flat_prices(payload: &ServicePayload, service: &mut NewService) -> AppResult<()> {
    let invalid = || bad_request_error("Invalid cost or selling price");
    let cost = decimal_value(&payload.cost_to_company).map_err(|_| invalid())?;
    let selling = decimal_value(&payload.selling_price).map_err(|_| invalid())?;

    let (Some(cost), Some(selling)) = (cost, selling) else {
        return Err(bad_request_error(
            "costToCompany and sellingPrice are required for non-accommodation services",
        ));
    };
    if cost.is_sign_negative() || selling.is_sign_negative() {
        return Err(bad_request_error("Cost and selling price must be non-negative"));
    }

    service.cost_to_company = Some(cost);
    service.selling_price = Some(selling);
    Ok(())
}

/// Importe enviado como número JSON o como texto; vacío o `null` es `None`
fn decimal_value(value: &Option<Value>) -> Result<Option<Decimal>, ()> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(()),
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map(|d| Some(d.normalize()))
        .map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn request(body: Value) -> BookingRequest {
        serde_json::from_value(body).unwrap()
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) => msg,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    fn base(services: Value) -> Value {
        json!({
            "clientId": Uuid::new_v4().to_string(),
            "overall_startDate": "2024-06-01",
            "overall_endDate": "2024-06-05",
            "services": services,
        })
    }

    #[test]
    fn test_mixed_booking_is_normalized() {
        let body = base(json!([
            {
                "serviceType": "Hotel", "serviceName": "Sea view", "startDate": "2024-06-01",
                "endDate": "2024-06-04", "hotelName": "Grand", "hotelCity": "Antalya",
                "roomType": "Double", "numNights": "3", "costPerNight": 80, "sellingPricePerNight": "100.50",
                "startTime": "10:00"
            },
            {
                "serviceType": "Tour", "serviceName": "Old town", "startDate": "2024-06-02",
                "endDate": "2024-06-02", "startTime": "09:30", "endTime": "12:00",
                "costToCompany": 20, "sellingPrice": 45
            },
            {
                "serviceType": "Vehicle", "serviceName": "Vito", "startDate": "2024-06-03",
                "endDate": "2024-06-03", "costToCompany": 15, "sellingPrice": 25,
                "is_hourly": true, "hours": 4, "with_driver": true
            }
        ]));

        let (booking, services) = validate_booking_payload(&request(body)).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.overall_start_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(services.len(), 3);

        let hotel = &services[0];
        assert_eq!(hotel.num_nights, Some(3));
        assert_eq!(hotel.selling_price_per_night, Some(dec!(100.5)));
        assert_eq!(hotel.start_time, None);
        assert_eq!(hotel.cost_to_company, None);

        let tour = &services[1];
        assert_eq!(tour.start_time, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(tour.selling_price, Some(dec!(45)));
        assert!(!tour.is_hourly);

        let rental = &services[2];
        assert!(rental.is_hourly);
        assert_eq!(rental.hours, Some(dec!(4)));
        assert_eq!(rental.with_driver, Some(true));
    }

    #[test]
    fn test_camel_case_overall_dates_are_accepted() {
        let body = json!({
            "clientId": Uuid::new_v4().to_string(),
            "overallStartDate": "2024-06-01",
            "overallEndDate": "2024-06-01",
            "status": "confirmed",
            "services": [{
                "serviceType": "Tour", "serviceName": "Bosphorus", "startDate": "2024-06-01",
                "endDate": "2024-06-01", "costToCompany": "0", "sellingPrice": "10"
            }]
        });
        let (booking, _) = validate_booking_payload(&request(body)).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_booking_level_errors() {
        let err = validate_booking_payload(&request(json!({}))).unwrap_err();
        assert_eq!(message(err), "clientId is required");

        let mut body = base(json!([]));
        let err = validate_booking_payload(&request(body.clone())).unwrap_err();
        assert_eq!(message(err), "services is required");

        body["services"] = json!([{ "serviceType": "Tour" }]);
        body["overall_endDate"] = json!("2024-05-01");
        let err = validate_booking_payload(&request(body.clone())).unwrap_err();
        assert_eq!(message(err), "Overall end date must be after overall start date");

        body["overall_endDate"] = json!("01/06/2024");
        let err = validate_booking_payload(&request(body)).unwrap_err();
        assert_eq!(message(err), "Invalid date format for overall dates. Use YYYY-MM-DD");
    }

    #[test]
    fn test_service_level_errors() {
        let case = |service: Value| message(validate_booking_payload(&request(base(json!([service])))).unwrap_err());

        assert_eq!(
            case(json!({ "serviceType": "Tour", "startDate": "2024-06-01", "endDate": "2024-06-01" })),
            "Service serviceName is required"
        );
        assert_eq!(
            case(json!({
                "serviceType": "Tour", "serviceName": "x", "startDate": "2024-06-02", "endDate": "2024-06-01"
            })),
            "Service end date must be after service start date"
        );
        assert_eq!(
            case(json!({
                "serviceType": "Tour", "serviceName": "x", "startDate": "2024-06-01", "endDate": "2024-06-01",
                "startTime": "9am", "costToCompany": 1, "sellingPrice": 2
            })),
            "Invalid start time format. Use HH:MM"
        );
        assert_eq!(
            case(json!({
                "serviceType": "Hotel", "serviceName": "x", "startDate": "2024-06-01", "endDate": "2024-06-02",
                "hotelName": "H", "hotelCity": "C", "numNights": 1, "costPerNight": 1, "sellingPricePerNight": 1
            })),
            "Service roomType is required for accommodation bookings"
        );
        assert_eq!(
            case(json!({
                "serviceType": "Cabin", "serviceName": "x", "startDate": "2024-06-01", "endDate": "2024-06-02",
                "hotelName": "H", "hotelCity": "C", "roomType": "R", "numNights": -1,
                "costPerNight": 1, "sellingPricePerNight": 1
            })),
            "Numeric values for accommodation must be positive"
        );
        assert_eq!(
            case(json!({
                "serviceType": "Vehicle", "serviceName": "x", "startDate": "2024-06-01", "endDate": "2024-06-01",
                "sellingPrice": 10
            })),
            "costToCompany and sellingPrice are required for non-accommodation services"
        );
        assert_eq!(
            case(json!({
                "serviceType": "Vehicle", "serviceName": "x", "startDate": "2024-06-01", "endDate": "2024-06-01",
                "costToCompany": -5, "sellingPrice": 10
            })),
            "Cost and selling price must be non-negative"
        );
        assert!(case(json!({
            "serviceType": "Boat", "serviceName": "x", "startDate": "2024-06-01", "endDate": "2024-06-01"
        }))
        .starts_with("Invalid service type: Boat"));
    }

    #[test]
    fn test_decimal_value_accepts_numbers_and_text() {
        assert_eq!(decimal_value(&Some(json!(12.5))), Ok(Some(dec!(12.5))));
        assert_eq!(decimal_value(&Some(json!(" 7 "))), Ok(Some(dec!(7))));
        assert_eq!(decimal_value(&Some(json!(""))), Ok(None));
        assert_eq!(decimal_value(&None), Ok(None));
        assert!(decimal_value(&Some(json!("abc"))).is_err());
        assert!(decimal_value(&Some(json!([1]))).is_err());
    }
}
