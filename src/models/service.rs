//! Modelo de Service
//!
//! Un servicio es la línea reservable de una reserva (hotel, cabaña, tour o
//! alquiler de vehículo). Aquí vive el cálculo de coste, precio de venta y
//! beneficio según el tipo de servicio.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tipo de servicio - se guarda como texto en `services.service_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Hotel,
    Cabin,
    Tour,
    Vehicle,
}

impl ServiceType {
    /// Tipos ofrecidos al frontend al crear reservas
    pub const OFFERED: [ServiceType; 3] = [ServiceType::Hotel, ServiceType::Vehicle, ServiceType::Tour];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Hotel => "Hotel",
            ServiceType::Cabin => "Cabin",
            ServiceType::Tour => "Tour",
            ServiceType::Vehicle => "Vehicle",
        }
    }

    pub fn is_accommodation(&self) -> bool {
        matches!(self, ServiceType::Hotel | ServiceType::Cabin)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Hotel" => Ok(ServiceType::Hotel),
            "Cabin" => Ok(ServiceType::Cabin),
            "Tour" => Ok(ServiceType::Tour),
            "Vehicle" => Ok(ServiceType::Vehicle),
            other => Err(format!("Unknown service type: {}", other)),
        }
    }
}

/// Service principal - mapea a la tabla services
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub service_type: String,
    pub service_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub cost_to_company: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub hotel_name: Option<String>,
    pub hotel_city: Option<String>,
    pub room_type: Option<String>,
    pub num_nights: Option<i32>,
    pub cost_per_night: Option<Decimal>,
    pub selling_price_per_night: Option<Decimal>,
    pub is_hourly: bool,
    pub hours: Option<Decimal>,
    pub with_driver: Option<bool>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn non_zero(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| !v.is_zero())
}

impl Service {
    pub fn kind(&self) -> Option<ServiceType> {
        self.service_type.parse().ok()
    }

    pub fn is_accommodation(&self) -> bool {
        self.kind().map_or(false, |k| k.is_accommodation())
    }

    pub fn is_tour(&self) -> bool {
        self.kind() == Some(ServiceType::Tour)
    }

    pub fn is_vehicle_rental(&self) -> bool {
        self.kind() == Some(ServiceType::Vehicle)
    }

    fn nights(&self) -> Option<Decimal> {
        self.num_nights.filter(|n| *n != 0).map(Decimal::from)
    }

    /// Tarifa por noche y tarifa plana aplicadas a un mismo servicio
    fn priced(&self, per_night: Option<Decimal>, flat: Option<Decimal>) -> Decimal {
        if self.is_accommodation() {
            if let (Some(nights), Some(rate)) = (self.nights(), non_zero(per_night)) {
                return nights * rate;
            }
        }
        if self.is_vehicle_rental() && self.is_hourly {
            if let (Some(hours), Some(rate)) = (non_zero(self.hours), non_zero(flat)) {
                return hours * rate;
            }
        }
        flat.unwrap_or(Decimal::ZERO)
    }

    pub fn total_cost(&self) -> Decimal {
        self.priced(self.cost_per_night, self.cost_to_company)
    }

    pub fn total_selling_price(&self) -> Decimal {
        self.priced(self.selling_price_per_night, self.selling_price)
    }

    pub fn profit(&self) -> Decimal {
        self.total_selling_price() - self.total_cost()
    }

    /// Inicio del servicio; sólo los tours tienen hora propia
    pub fn start_date_time(&self) -> NaiveDateTime {
        match (self.is_tour(), self.start_time) {
            (true, Some(time)) => self.start_date.and_time(time),
            _ => self.start_date.and_time(NaiveTime::MIN),
        }
    }

    pub fn end_date_time(&self) -> NaiveDateTime {
        match (self.is_tour(), self.end_time) {
            (true, Some(time)) => self.end_date.and_time(time),
            _ => self
                .end_date
                .and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)),
        }
    }

    /// Texto "N Nights" / "H Hours" / fecha(s) usado en facturas mensuales
    pub fn nights_or_hours(&self) -> String {
        if self.is_accommodation() {
            if let Some(nights) = self.num_nights {
                return format!("{} Nights", nights);
            }
        }
        if self.is_vehicle_rental() && self.is_hourly {
            if let Some(hours) = self.hours {
                return format!("{} Hours", hours.normalize());
            }
        }
        if self.start_date == self.end_date {
            self.start_date.format("%Y-%m-%d").to_string()
        } else {
            format!(
                "{} to {}",
                self.start_date.format("%Y-%m-%d"),
                self.end_date.format("%Y-%m-%d")
            )
        }
    }

    /// Tiempo "HH:MM" o el marcador usado en los avisos
    pub fn start_time_label(&self) -> String {
        self.start_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "Belirtilmemiş".to_string())
    }
}

/// Servicio con su reserva, cliente, conductor y vehículo
#[derive(Debug, Clone, FromRow)]
pub struct ServiceDetail {
    #[sqlx(flatten)]
    pub service: Service,
    pub booking_status: String,
    pub booking_created_at: DateTime<Utc>,
    pub booking_start_date: NaiveDate,
    pub client_id: Uuid,
    pub client_first_name: String,
    pub client_last_name: String,
    pub client_email: Option<String>,
    pub client_company_id: Option<Uuid>,
    pub driver_first_name: Option<String>,
    pub driver_last_name: Option<String>,
    pub driver_phone: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_plate: Option<String>,
}

impl ServiceDetail {
    pub fn client_name(&self) -> String {
        format!("{} {}", self.client_first_name, self.client_last_name)
    }

    pub fn driver_name(&self) -> Option<String> {
        match (&self.driver_first_name, &self.driver_last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        }
    }

    pub fn vehicle_info(&self) -> Option<String> {
        match (&self.vehicle_model, &self.vehicle_plate) {
            (Some(model), Some(plate)) => Some(format!("{} - {}", model, plate)),
            _ => None,
        }
    }
}

/// Servicio validado listo para insertar
#[derive(Debug, Clone, PartialEq)]
pub struct NewService {
    pub service_type: ServiceType,
    pub service_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
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
    pub is_hourly: bool,
    pub hours: Option<Decimal>,
    pub with_driver: Option<bool>,
    pub notes: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn service(service_type: &str) -> Service {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        Service {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            driver_id: None,
            vehicle_id: None,
            service_type: service_type.to_string(),
            service_name: format!("{} service", service_type),
            start_date: date,
            end_date: date,
            start_time: None,
            end_time: None,
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
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn detail(service: Service, client_id: Uuid, client_name: &str) -> ServiceDetail {
        let (first, last) = client_name.split_once(' ').unwrap_or((client_name, ""));
        ServiceDetail {
            booking_start_date: service.start_date,
            service,
            booking_status: "confirmed".to_string(),
            booking_created_at: Utc::now(),
            client_id,
            client_first_name: first.to_string(),
            client_last_name: last.to_string(),
            client_email: None,
            client_company_id: None,
            driver_first_name: None,
            driver_last_name: None,
            driver_phone: None,
            vehicle_model: None,
            vehicle_plate: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::service;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_hotel_priced_per_night() {
        let mut hotel = service("Hotel");
        hotel.num_nights = Some(3);
        hotel.cost_per_night = Some(dec!(80));
        hotel.selling_price_per_night = Some(dec!(100));
        assert_eq!(hotel.total_cost(), dec!(240));
        assert_eq!(hotel.total_selling_price(), dec!(300));
        assert_eq!(hotel.profit(), dec!(60));
    }

    #[test]
    fn test_cabin_without_nights_falls_back_to_flat_price() {
        let mut cabin = service("Cabin");
        cabin.num_nights = Some(0);
        cabin.cost_per_night = Some(dec!(50));
        cabin.cost_to_company = Some(dec!(20));
        assert_eq!(cabin.total_cost(), dec!(20));
        assert_eq!(cabin.total_selling_price(), dec!(0));
    }

    #[test]
    fn test_hourly_vehicle_rental() {
        let mut rental = service("Vehicle");
        rental.is_hourly = true;
        rental.hours = Some(dec!(4));
        rental.cost_to_company = Some(dec!(25));
        rental.selling_price = Some(dec!(40));
        assert_eq!(rental.total_cost(), dec!(100));
        assert_eq!(rental.total_selling_price(), dec!(160));
        assert_eq!(rental.profit(), dec!(60));
        assert_eq!(rental.nights_or_hours(), "4 Hours");
    }

    #[test]
    fn test_daily_vehicle_rental_uses_flat_price() {
        let mut rental = service("Vehicle");
        rental.hours = Some(dec!(4));
        rental.cost_to_company = Some(dec!(25));
        rental.selling_price = Some(dec!(40));
        assert_eq!(rental.total_cost(), dec!(25));
        assert_eq!(rental.profit(), dec!(15));
    }

    #[test]
    fn test_tour_date_times() {
        let mut tour = service("Tour");
        tour.start_time = NaiveTime::from_hms_opt(9, 30, 0);
        assert_eq!(tour.start_date_time().format("%H:%M").to_string(), "09:30");
        assert_eq!(tour.end_date_time().format("%H:%M").to_string(), "23:59");
        assert_eq!(tour.start_time_label(), "09:30");

        let mut hotel = service("Hotel");
        hotel.start_time = NaiveTime::from_hms_opt(9, 30, 0);
        assert_eq!(hotel.start_date_time().format("%H:%M").to_string(), "00:00");
    }

    #[test]
    fn test_nights_or_hours_labels() {
        let mut hotel = service("Hotel");
        hotel.num_nights = Some(2);
        assert_eq!(hotel.nights_or_hours(), "2 Nights");

        let mut tour = service("Tour");
        assert_eq!(tour.nights_or_hours(), "2024-05-10");
        tour.end_date = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        assert_eq!(tour.nights_or_hours(), "2024-05-10 to 2024-05-12");
        assert_eq!(tour.start_time_label(), "Belirtilmemiş");
    }

    #[test]
    fn test_service_type_parsing() {
        assert_eq!("Cabin".parse::<ServiceType>(), Ok(ServiceType::Cabin));
        assert!("Flight".parse::<ServiceType>().is_err());
        assert!(ServiceType::Hotel.is_accommodation());
        assert!(!ServiceType::Tour.is_accommodation());
    }
}
