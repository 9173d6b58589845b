use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{InvoiceWithBooking, MonthlyInvoiceItem, MonthlyInvoiceWithCompany};
use crate::utils::validation::{blank_as_none, blank_as_none_uuid};

// Request para generar una factura mensual de empresa
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyInvoiceRequest {
    #[serde(default, deserialize_with = "blank_as_none_uuid")]
    pub company_id: Option<Uuid>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub invoice_type: Option<String>,
}

// Request para la factura detallada de un cliente
#[derive(Debug, Default, Deserialize)]
pub struct ClientInvoiceRequest {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

// Respuesta de una factura recién generada
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedInvoiceResponse {
    pub message: String,
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,
}

// Entrada del listado unificado de facturas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListEntry {
    pub id: String,
    pub client: String,
    pub service: String,
    #[serde(rename = "type")]
    pub invoice_type: String,
    pub status: String,
    pub date: String,
    pub amount: Decimal,
    pub pdf_path: String,
}

impl From<InvoiceWithBooking> for InvoiceListEntry {
    fn from(row: InvoiceWithBooking) -> Self {
        let client = row.client_name();
        let service = row.service_summary();
        let invoice = row.invoice;
        Self {
            id: invoice.id.to_string(),
            client,
            service,
            invoice_type: invoice.invoice_type,
            status: invoice.status,
            date: invoice.invoice_date.format("%Y-%m-%d").to_string(),
            amount: invoice.total_amount,
            pdf_path: invoice.pdf_path.unwrap_or_default(),
        }
    }
}

impl From<&MonthlyInvoiceWithCompany> for InvoiceListEntry {
    fn from(row: &MonthlyInvoiceWithCompany) -> Self {
        let invoice = &row.invoice;
        Self {
            id: format!("monthly_{}", invoice.id),
            client: row.company_name.clone(),
            service: format!("Monthly Invoice - {}", invoice.invoice_period()),
            invoice_type: "company".to_string(),
            status: invoice.status.clone(),
            date: invoice.invoice_date.format("%Y-%m-%d").to_string(),
            amount: invoice.total_amount,
            pdf_path: invoice.pdf_path.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyInvoiceItemResponse {
    pub id: Uuid,
    pub service_id: Option<Uuid>,
    pub client_name: String,
    pub arrival_date: Option<NaiveDate>,
    pub service_type: String,
    pub service_name: String,
    pub service_date: NaiveDate,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub profit: Decimal,
    pub nights_or_hours: Option<String>,
    pub city: Option<String>,
    pub hotel_or_tour_name: Option<String>,
}

impl From<MonthlyInvoiceItem> for MonthlyInvoiceItemResponse {
    fn from(item: MonthlyInvoiceItem) -> Self {
        Self {
            id: item.id,
            service_id: item.service_id,
            client_name: item.client_name,
            arrival_date: item.arrival_date,
            service_type: item.service_type,
            service_name: item.service_name,
            service_date: item.service_date,
            cost_price: item.cost_price,
            selling_price: item.selling_price,
            profit: item.profit,
            nights_or_hours: item.nights_or_hours,
            city: item.city,
            hotel_or_tour_name: item.hotel_or_tour_name,
        }
    }
}

// Factura mensual con sus líneas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyInvoiceResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub invoice_month: i32,
    pub invoice_year: i32,
    pub invoice_period: String,
    pub total_amount: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub invoice_type: String,
    pub status: String,
    pub invoice_date: NaiveDate,
    pub pdf_path: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<MonthlyInvoiceItemResponse>,
}

impl MonthlyInvoiceResponse {
    pub fn new(row: MonthlyInvoiceWithCompany, items: Vec<MonthlyInvoiceItem>) -> Self {
        let invoice_period = row.invoice.invoice_period();
        let invoice = row.invoice;
        Self {
            id: invoice.id,
            company_id: invoice.company_id,
            company_name: row.company_name,
            invoice_month: invoice.invoice_month,
            invoice_year: invoice.invoice_year,
            invoice_period,
            total_amount: invoice.total_amount,
            total_cost: invoice.total_cost,
            total_profit: invoice.total_profit,
            invoice_type: invoice.invoice_type,
            status: invoice.status,
            invoice_date: invoice.invoice_date,
            pdf_path: invoice.pdf_path,
            notes: invoice.notes,
            created_at: invoice.created_at,
            items: items.into_iter().map(MonthlyInvoiceItemResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_monthly_request_accepts_blank_company() {
        let request: MonthlyInvoiceRequest =
            serde_json::from_value(json!({"companyId": "", "month": 3, "year": 2024})).unwrap();
        assert!(request.company_id.is_none());
        assert_eq!(request.month, Some(3));
        assert!(request.invoice_type.is_none());
    }
}
