use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Las respuestas del dashboard se guardan tal cual en la cache, de ahí Deserialize

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub upcoming_bookings_count: usize,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub active_clients: i64,
    pub selected_month: u32,
    pub selected_year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalCounts {
    pub clients: i64,
    pub drivers: i64,
    pub vehicles: i64,
    pub bookings: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_counts: TotalCounts,
    pub booking_status_breakdown: BTreeMap<String, i64>,
    pub service_type_breakdown: BTreeMap<String, i64>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingBookingEntry {
    pub id: Uuid,
    pub client: String,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayServiceEntry {
    pub service_name: String,
    pub service_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayBookingEntry {
    pub id: Uuid,
    pub client: String,
    pub services: Vec<TodayServiceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccommodationBreakdown {
    #[serde(rename = "type")]
    pub accommodation_type: String,
    pub bookings: u32,
    pub nights: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccommodationStats {
    pub total_nights: i64,
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub accommodation_breakdown: BTreeMap<String, AccommodationBreakdown>,
}
