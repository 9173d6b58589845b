use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Company, CompanyWithCount, ServiceDetail};
use crate::utils::validation::blank_as_none;

// Request para crear o actualizar una empresa
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRequest {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 200))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 100))]
    pub contact_person: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub logo_path: Option<String>,
}

// Filtro opcional de periodo
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

// Response de empresa
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub logo_path: Option<String>,
    pub client_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<CompanyWithCount> for CompanyResponse {
    fn from(row: CompanyWithCount) -> Self {
        let company = row.company;
        Self {
            id: company.id,
            name: company.name,
            contact_person: company.contact_person,
            email: company.email,
            phone: company.phone,
            address: company.address,
            logo_path: company.logo_path,
            client_count: row.client_count,
            created_at: company.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyHeader {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub contact_person: Option<String>,
}

impl From<&Company> for CompanyHeader {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            email: company.email.clone(),
            contact_person: company.contact_person.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyClientService {
    pub service_name: String,
    pub service_type: String,
    pub start_date: NaiveDate,
    pub total_selling_price: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyClientEntry {
    pub client_id: Uuid,
    pub client_name: String,
    pub email: Option<String>,
    pub services: Vec<CompanyClientService>,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CompanyClientsResponse {
    pub company: CompanyHeader,
    pub clients: Vec<CompanyClientEntry>,
}

// Servicio detallado para la preparación de la factura mensual
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedServiceEntry {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub service_name: String,
    pub service_type: String,
    pub service_category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_selling_price: Decimal,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub nights: Option<i32>,
    pub hours: Option<Decimal>,
    pub hotel_name: Option<String>,
    pub city: Option<String>,
}

impl From<&ServiceDetail> for DetailedServiceEntry {
    fn from(detail: &ServiceDetail) -> Self {
        let service = &detail.service;
        let accommodation = service.is_accommodation();
        Self {
            id: service.id,
            booking_id: service.booking_id,
            service_name: service.service_name.clone(),
            service_type: service.service_type.clone(),
            service_category: if accommodation { "Hotels" } else { "Tours and Car Rentals" }.to_string(),
            start_date: service.start_date,
            end_date: service.end_date,
            total_selling_price: service.total_selling_price(),
            total_cost: service.total_cost(),
            profit: service.profit(),
            nights: service.num_nights.filter(|_| accommodation),
            hours: service.hours.filter(|_| service.is_hourly),
            hotel_name: service.hotel_name.clone().filter(|_| accommodation),
            city: service.hotel_city.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedClientEntry {
    pub client_id: Uuid,
    pub client_name: String,
    pub email: Option<String>,
    pub arrival_date: NaiveDate,
    pub services: Vec<DetailedServiceEntry>,
    pub total_selling_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PeriodEcho {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyClientsDetailedResponse {
    pub company: CompanyHeader,
    pub clients: Vec<DetailedClientEntry>,
    pub total_revenue: Decimal,
    pub period: Option<PeriodEcho>,
}
