//! Agregados del dashboard
//!
//! Los cálculos de ingresos se hacen en Rust sobre los servicios, con las
//! mismas reglas de precio que las reservas. Cada sección pasa por la cache.

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{Datelike, Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;

use crate::cache::DashboardCache;
use crate::dto::dashboard_dto::{
    AccommodationBreakdown, AccommodationStats, DashboardStats, DashboardSummary, MonthlyRevenue,
    SummaryQuery, TodayBookingEntry, TodayServiceEntry, TotalCounts, UpcomingBookingEntry,
};
use crate::models::{BookingStatus, BookingTotals, Service, ServiceDetail};
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::dashboard_repository::DashboardRepository;
use crate::repositories::service_repository::ServiceRepository;
use crate::utils::calendar::{month_bounds, trailing_months};
use crate::utils::errors::{internal_error, AppError};

const UPCOMING_DAYS: i64 = 7;
const REVENUE_MONTHS: u32 = 6;
const TODAY_STATUSES: [&str; 3] = ["pending", "confirmed", "completed"];
const ACCOMMODATION_TYPES: [&str; 2] = ["Hotel", "Cabin"];

/// Totales de venta y beneficio de un conjunto de servicios
pub fn revenue_and_profit(details: &[ServiceDetail]) -> (Decimal, Decimal) {
    let totals = BookingTotals::of(details.iter().map(|d| &d.service));
    (totals.total_selling_price, totals.profit)
}

/// Ingresos por mes de inicio de reserva, un valor por cada mes pedido
pub fn monthly_revenue(months: &[(i32, u32)], details: &[ServiceDetail]) -> Vec<MonthlyRevenue> {
    let mut by_month: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for detail in details {
        let key = (detail.booking_start_date.year(), detail.booking_start_date.month());
        *by_month.entry(key).or_default() += detail.service.total_selling_price();
    }

    months
        .iter()
        .map(|(year, month)| MonthlyRevenue {
            month: format!("{:04}-{:02}", year, month),
            revenue: by_month.get(&(*year, *month)).copied().unwrap_or_default(),
        })
        .collect()
}

/// Reservas de hoy con los servicios que empiezan hoy; las demás se omiten
pub fn todays_bookings(today: NaiveDate, details: &[ServiceDetail]) -> Vec<TodayBookingEntry> {
    let mut entries: Vec<TodayBookingEntry> = Vec::new();
    for detail in details.iter().filter(|d| d.service.start_date == today) {
        let service = TodayServiceEntry {
            service_name: detail.service.service_name.clone(),
            service_type: detail.service.service_type.clone(),
        };
        match entries.iter_mut().find(|e| e.id == detail.service.booking_id) {
            Some(entry) => entry.services.push(service),
            None => entries.push(TodayBookingEntry {
                id: detail.service.booking_id,
                client: detail.client_name(),
                services: vec![service],
            }),
        }
    }
    entries
}

pub fn accommodation_stats(services: &[Service]) -> AccommodationStats {
    let mut breakdown: BTreeMap<String, AccommodationBreakdown> = BTreeMap::new();
    let mut total_nights = 0i64;
    let mut total_revenue = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;

    for service in services.iter().filter(|s| s.is_accommodation()) {
        let nights = i64::from(service.num_nights.unwrap_or(0));
        total_nights += nights;
        total_revenue += service.total_selling_price();
        total_cost += service.total_cost();

        let Some(name) = service.hotel_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        let entry = breakdown
            .entry(name.to_string())
            .or_insert_with(|| AccommodationBreakdown {
                accommodation_type: service.service_type.clone(),
                ..Default::default()
            });
        entry.bookings += 1;
        entry.nights += nights;
        entry.revenue += service.total_selling_price();
        entry.profit += service.profit();
    }

    AccommodationStats {
        total_nights,
        total_revenue,
        total_cost,
        total_profit: total_revenue - total_cost,
        accommodation_breakdown: breakdown,
    }
}

/// Mes y año de la query; un mes fuera de rango usa el mes actual y un valor
/// no numérico reinicia ambos al periodo actual
pub fn selected_period(query: &SummaryQuery, today: NaiveDate) -> (u32, i32) {
    let month = query.month.as_deref().map(|m| m.trim().parse::<u32>());
    let year = query.year.as_deref().map(|y| y.trim().parse::<i32>());

    match (month.unwrap_or(Ok(today.month())), year.unwrap_or(Ok(today.year()))) {
        (Ok(m), Ok(y)) if (1..=9999).contains(&y) => {
            if (1..=12).contains(&m) {
                (m, y)
            } else {
                (today.month(), y)
            }
        }
        _ => (today.month(), today.year()),
    }
}

pub struct DashboardController {
    repository: DashboardRepository,
    bookings: BookingRepository,
    services: ServiceRepository,
    cache: DashboardCache,
}

impl DashboardController {
    pub fn new(pool: PgPool, cache: DashboardCache) -> Self {
        Self {
            repository: DashboardRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            services: ServiceRepository::new(pool),
            cache,
        }
    }

    /// Lectura a través de la cache: si la sección no está, se calcula y se guarda
    async fn cached<T, F, Fut>(&self, section: &str, compute: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(hit) = self.cache.get::<T>(section).await {
            tracing::debug!("📦 Dashboard cache hit [{}]", section);
            return Ok(hit);
        }
        let value = compute().await?;
        self.cache.put(section, &value).await;
        Ok(value)
    }

    pub async fn summary(&self, query: SummaryQuery) -> Result<DashboardSummary, AppError> {
        let today = Local::now().date_naive();
        let (month, year) = selected_period(&query, today);
        let section = format!("summary:{}-{:02}:{}", year, month, today);

        self.cached(&section, || async move {
            let (month_start, next_month) =
                month_bounds(year, month).ok_or_else(|| internal_error("Invalid month range"))?;
            let upcoming = self
                .bookings
                .starting_between(today, today + Duration::days(UPCOMING_DAYS), &BookingStatus::ACTIVE)
                .await?;
            let details = self
                .services
                .details_for_bookings_starting_between(month_start, next_month, &BookingStatus::BILLABLE)
                .await?;
            let (total_revenue, total_profit) = revenue_and_profit(&details);

            Ok::<_, AppError>(DashboardSummary {
                upcoming_bookings_count: upcoming.len(),
                total_revenue,
                total_profit,
                active_clients: self.repository.count_clients().await?,
                selected_month: month,
                selected_year: year,
            })
        })
        .await
    }

    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        let today = Local::now().date_naive();
        let section = format!("stats:{}", today);

        self.cached(&section, || async move {
            let counts = self.repository.table_counts().await?;
            let months = trailing_months(today, REVENUE_MONTHS);
            let (first_year, first_month) = months.first().copied().unwrap_or((today.year(), today.month()));
            let from = month_bounds(first_year, first_month).map(|(start, _)| start);
            let until = month_bounds(today.year(), today.month()).map(|(_, next)| next);
            let (Some(from), Some(until)) = (from, until) else {
                return Err(internal_error("Invalid month range"));
            };
            let details = self
                .services
                .details_for_bookings_starting_between(from, until, &BookingStatus::BILLABLE)
                .await?;

            Ok::<_, AppError>(DashboardStats {
                total_counts: TotalCounts {
                    clients: counts.clients,
                    drivers: counts.drivers,
                    vehicles: counts.vehicles,
                    bookings: counts.bookings,
                },
                booking_status_breakdown: self.repository.booking_status_breakdown().await?.into_iter().collect(),
                service_type_breakdown: self.repository.service_type_breakdown().await?.into_iter().collect(),
                monthly_revenue: monthly_revenue(&months, &details),
            })
        })
        .await
    }

    pub async fn upcoming_bookings(&self) -> Result<Vec<UpcomingBookingEntry>, AppError> {
        let today = Local::now().date_naive();
        let section = format!("upcoming:{}", today);

        self.cached(&section, || async move {
            let bookings = self
                .bookings
                .starting_between(today, today + Duration::days(UPCOMING_DAYS), &BookingStatus::ACTIVE)
                .await?;
            tracing::info!("📅 {} reservas en los próximos {} días", bookings.len(), UPCOMING_DAYS);

            Ok::<_, AppError>(bookings
                .into_iter()
                .filter(|b| b.client_first_name.is_some())
                .map(|b| UpcomingBookingEntry {
                    id: b.booking.id,
                    client: b.client_name(),
                    start_date: b.booking.overall_start_date,
                })
                .collect())
        })
        .await
    }

    pub async fn todays_bookings(&self) -> Result<Vec<TodayBookingEntry>, AppError> {
        let today = Local::now().date_naive();
        let section = format!("today:{}", today);

        self.cached(&section, || async move {
            let details = self
                .services
                .details_for_bookings_starting_between(today, today + Duration::days(1), &TODAY_STATUSES)
                .await?;
            Ok::<_, AppError>(todays_bookings(today, &details))
        })
        .await
    }

    pub async fn accommodation_stats(&self) -> Result<AccommodationStats, AppError> {
        self.cached("accommodation", || async move {
            let services = self.services.find_by_types(&ACCOMMODATION_TYPES).await?;
            Ok::<_, AppError>(accommodation_stats(&services))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::fixtures::{detail, service};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn booking_ids(entries: &[TodayBookingEntry]) -> Vec<Uuid> {
        entries.iter().map(|e| e.id).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn priced(service_type: &str, cost: Decimal, selling: Decimal, booking_start: NaiveDate) -> ServiceDetail {
        let mut s = service(service_type);
        s.cost_to_company = Some(cost);
        s.selling_price = Some(selling);
        let mut d = detail(s, Uuid::new_v4(), "Ali Demir");
        d.booking_start_date = booking_start;
        d
    }

    #[test]
    fn test_revenue_and_profit_sum_services() {
        let details = vec![
            priced("Tour", dec!(40), dec!(60), date(2024, 5, 1)),
            priced("Vehicle", dec!(20), dec!(35), date(2024, 5, 3)),
        ];
        assert_eq!(revenue_and_profit(&details), (dec!(95), dec!(35)));
    }

    #[test]
    fn test_monthly_revenue_fills_missing_months() {
        let months = trailing_months(date(2024, 2, 15), 3);
        let details = vec![
            priced("Tour", dec!(0), dec!(100), date(2023, 12, 20)),
            priced("Tour", dec!(0), dec!(50), date(2024, 2, 1)),
            priced("Tour", dec!(0), dec!(25), date(2024, 2, 9)),
        ];

        assert_eq!(
            monthly_revenue(&months, &details),
            vec![
                MonthlyRevenue { month: "2023-12".to_string(), revenue: dec!(100) },
                MonthlyRevenue { month: "2024-01".to_string(), revenue: dec!(0) },
                MonthlyRevenue { month: "2024-02".to_string(), revenue: dec!(75) },
            ]
        );
    }

    #[test]
    fn test_todays_bookings_group_services_starting_today() {
        let today = date(2024, 5, 10);
        let booking_id = Uuid::new_v4();
        let mut tour = service("Tour");
        tour.booking_id = booking_id;
        let mut hotel = service("Hotel");
        hotel.booking_id = booking_id;
        let mut later = service("Vehicle");
        later.start_date = date(2024, 5, 12);
        later.end_date = later.start_date;

        let details = vec![
            detail(tour, Uuid::new_v4(), "Ali Demir"),
            detail(hotel, Uuid::new_v4(), "Ali Demir"),
            detail(later, Uuid::new_v4(), "Ayşe Kaya"),
        ];
        let entries = todays_bookings(today, &details);

        assert_eq!(booking_ids(&entries), vec![booking_id]);
        assert_eq!(entries[0].client, "Ali Demir");
        assert_eq!(entries[0].services.len(), 2);
    }

    #[test]
    fn test_accommodation_stats_group_by_hotel() {
        let mut first = service("Hotel");
        first.hotel_name = Some("Pera Palace".to_string());
        first.num_nights = Some(2);
        first.cost_per_night = Some(dec!(60));
        first.selling_price_per_night = Some(dec!(100));
        let mut second = first.clone();
        second.num_nights = Some(1);
        let mut cabin = service("Cabin");
        cabin.num_nights = Some(3);
        cabin.selling_price = Some(dec!(90));
        let tour = service("Tour");

        let stats = accommodation_stats(&[first, second, cabin, tour]);
        assert_eq!(stats.total_nights, 6);
        assert_eq!(stats.total_revenue, dec!(390));
        assert_eq!(stats.total_cost, dec!(180));
        assert_eq!(stats.total_profit, dec!(210));

        let pera = &stats.accommodation_breakdown["Pera Palace"];
        assert_eq!(pera.bookings, 2);
        assert_eq!(pera.nights, 3);
        assert_eq!(pera.profit, dec!(120));
        assert_eq!(stats.accommodation_breakdown.len(), 1);
    }

    #[test]
    fn test_selected_period_falls_back_to_current_month() {
        let today = date(2024, 5, 10);
        let query = |m: Option<&str>, y: Option<&str>| SummaryQuery {
            month: m.map(str::to_string),
            year: y.map(str::to_string),
        };
        assert_eq!(selected_period(&query(Some("3"), Some("2023")), today), (3, 2023));
        assert_eq!(selected_period(&query(Some("13"), Some("2023")), today), (5, 2023));
        assert_eq!(selected_period(&query(Some("abc"), None), today), (5, 2024));
        assert_eq!(selected_period(&query(None, None), today), (5, 2024));
        assert_eq!(selected_period(&query(Some("2"), None), today), (2, 2024));
    }
}
