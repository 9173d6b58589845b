//! Modelos de facturación
//!
//! Facturas de cliente (ligadas a una reserva) y facturas mensuales de empresa
//! con sus líneas.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::calendar::period_label;

/// Invoice de cliente - mapea a la tabla invoices
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub invoice_type: String,
    pub total_amount: Decimal,
    pub status: String,
    pub invoice_date: NaiveDate,
    pub pdf_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Factura de cliente con el cliente y los servicios de su reserva
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceWithBooking {
    #[sqlx(flatten)]
    pub invoice: Invoice,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
    pub service_names: Option<Vec<String>>,
}

impl InvoiceWithBooking {
    pub fn client_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.client_first_name.as_deref().unwrap_or(""),
            self.client_last_name.as_deref().unwrap_or("")
        );
        match name.trim() {
            "" => "Unknown".to_string(),
            trimmed => trimmed.to_string(),
        }
    }

    /// "A, B (+n more)" o "No services"
    pub fn service_summary(&self) -> String {
        let names = self.service_names.as_deref().unwrap_or(&[]);
        if names.is_empty() {
            return "No services".to_string();
        }
        let mut summary = names.iter().take(2).cloned().collect::<Vec<_>>().join(", ");
        if names.len() > 2 {
            summary.push_str(&format!(" (+{} more)", names.len() - 2));
        }
        summary
    }
}

/// Destinatario de la factura mensual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyInvoiceType {
    /// Factura para la empresa asociada (precios de venta)
    PartnerCompany,
    /// Informe interno de costes y beneficio
    MyCompany,
}

impl MonthlyInvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonthlyInvoiceType::PartnerCompany => "partner_company",
            MonthlyInvoiceType::MyCompany => "my_company",
        }
    }

    pub fn serial_prefix(&self) -> &'static str {
        match self {
            MonthlyInvoiceType::PartnerCompany => "COMP",
            MonthlyInvoiceType::MyCompany => "INT",
        }
    }
}

impl Default for MonthlyInvoiceType {
    fn default() -> Self {
        MonthlyInvoiceType::PartnerCompany
    }
}

impl FromStr for MonthlyInvoiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "partner_company" => Ok(MonthlyInvoiceType::PartnerCompany),
            "my_company" => Ok(MonthlyInvoiceType::MyCompany),
            other => Err(format!("Invalid invoice type: {}", other)),
        }
    }
}

/// MonthlyCompanyInvoice - mapea a la tabla monthly_company_invoices
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MonthlyCompanyInvoice {
    pub id: Uuid,
    pub company_id: Uuid,
    pub invoice_month: i32,
    pub invoice_year: i32,
    pub total_amount: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub invoice_type: String,
    pub status: String,
    pub invoice_date: NaiveDate,
    pub pdf_path: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MonthlyCompanyInvoice {
    pub fn invoice_period(&self) -> String {
        period_label(self.invoice_month as u32, self.invoice_year)
    }
}

/// Factura mensual con el nombre de la empresa
#[derive(Debug, Clone, FromRow)]
pub struct MonthlyInvoiceWithCompany {
    #[sqlx(flatten)]
    pub invoice: MonthlyCompanyInvoice,
    pub company_name: String,
}

/// MonthlyInvoiceItem - mapea a la tabla monthly_invoice_items
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MonthlyInvoiceItem {
    pub id: Uuid,
    pub monthly_invoice_id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

/// Línea calculada antes de insertarla
#[derive(Debug, Clone, PartialEq)]
pub struct NewMonthlyInvoiceItem {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(first: Option<&str>, names: &[&str]) -> InvoiceWithBooking {
        InvoiceWithBooking {
            invoice: Invoice {
                id: Uuid::new_v4(),
                booking_id: Uuid::new_v4(),
                invoice_type: "client".to_string(),
                total_amount: Decimal::ZERO,
                status: "completed".to_string(),
                invoice_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                pdf_path: None,
                created_at: Utc::now(),
            },
            client_first_name: first.map(str::to_string),
            client_last_name: None,
            service_names: Some(names.iter().map(|n| n.to_string()).collect()),
        }
    }

    #[test]
    fn test_invoice_service_summary() {
        assert_eq!(listed(None, &[]).service_summary(), "No services");
        assert_eq!(listed(None, &["Bosphorus Tour"]).service_summary(), "Bosphorus Tour");
        assert_eq!(
            listed(None, &["A", "B", "C", "D"]).service_summary(),
            "A, B (+2 more)"
        );
        assert_eq!(listed(None, &[]).client_name(), "Unknown");
        assert_eq!(listed(Some("Ayse"), &[]).client_name(), "Ayse");
    }

    #[test]
    fn test_monthly_invoice_type() {
        assert_eq!(
            "my_company".parse::<MonthlyInvoiceType>(),
            Ok(MonthlyInvoiceType::MyCompany)
        );
        assert!("client".parse::<MonthlyInvoiceType>().is_err());
        assert_eq!(MonthlyInvoiceType::default().serial_prefix(), "COMP");
        assert_eq!(MonthlyInvoiceType::MyCompany.serial_prefix(), "INT");
    }
}
