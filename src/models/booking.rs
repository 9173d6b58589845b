//! Modelo de Booking
//!
//! Una reserva agrupa los servicios de un cliente; sus totales son la suma
//! de los totales de cada servicio.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::service::Service;

/// Estado de la reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Estados que todavía requieren atención operativa
    pub const ACTIVE: [&'static str; 2] = ["pending", "confirmed"];
    /// Estados que cuentan como ingreso
    pub const BILLABLE: [&'static str; 2] = ["confirmed", "completed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Invalid booking status: {}", other)),
        }
    }
}

/// Booking principal - mapea a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub client_id: Uuid,
    pub overall_start_date: NaiveDate,
    pub overall_end_date: NaiveDate,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Reserva con el nombre de su cliente
#[derive(Debug, Clone, FromRow)]
pub struct BookingWithClient {
    #[sqlx(flatten)]
    pub booking: Booking,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
}

impl BookingWithClient {
    pub fn client_name(&self) -> String {
        match (&self.client_first_name, &self.client_last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            _ => "Unknown Client".to_string(),
        }
    }
}

/// Reserva validada lista para guardar
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub client_id: Uuid,
    pub overall_start_date: NaiveDate,
    pub overall_end_date: NaiveDate,
    pub notes: Option<String>,
    pub status: BookingStatus,
}

/// Totales agregados de un conjunto de servicios
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingTotals {
    pub total_cost: Decimal,
    pub total_selling_price: Decimal,
    pub profit: Decimal,
}

impl BookingTotals {
    pub fn of<'a>(services: impl IntoIterator<Item = &'a Service>) -> Self {
        let (total_cost, total_selling_price) = services
            .into_iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(cost, selling), s| {
                (cost + s.total_cost(), selling + s.total_selling_price())
            });
        Self {
            total_cost,
            total_selling_price,
            profit: total_selling_price - total_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::fixtures::service;
    use rust_decimal_macros::dec;

    #[test]
    fn test_totals_sum_services() {
        let mut hotel = service("Hotel");
        hotel.num_nights = Some(2);
        hotel.cost_per_night = Some(dec!(50));
        hotel.selling_price_per_night = Some(dec!(70));

        let mut tour = service("Tour");
        tour.cost_to_company = Some(dec!(30));
        tour.selling_price = Some(dec!(45.50));

        let totals = BookingTotals::of([&hotel, &tour]);
        assert_eq!(totals.total_cost, dec!(130));
        assert_eq!(totals.total_selling_price, dec!(185.50));
        assert_eq!(totals.profit, dec!(55.50));
    }

    #[test]
    fn test_totals_of_empty_booking() {
        assert_eq!(BookingTotals::of(Vec::<&Service>::new()), BookingTotals::default());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("confirmed".parse::<BookingStatus>(), Ok(BookingStatus::Confirmed));
        assert!("archived".parse::<BookingStatus>().is_err());
        assert_eq!(BookingStatus::default().as_str(), "pending");
    }
}
