use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::dto::invoice_dto::{
    ClientInvoiceRequest, GeneratedInvoiceResponse, InvoiceListEntry, MonthlyInvoiceRequest,
    MonthlyInvoiceResponse,
};
use crate::models::{MonthlyInvoiceType, NewMonthlyInvoiceItem, ServiceDetail};
use crate::repositories::client_repository::ClientRepository;
use crate::repositories::company_repository::CompanyRepository;
use crate::repositories::invoice_repository::{InvoiceRepository, NewMonthlyInvoice};
use crate::repositories::service_repository::ServiceRepository;
use crate::repositories::settings_repository::SettingsRepository;
use crate::services::pdf_service::{
    client_invoice_document, client_invoice_filename, download_path, monthly_invoice_document,
    monthly_invoice_filename, write_invoice, ClientInvoiceInput, MonthlyInvoiceInput,
};
use crate::utils::calendar::month_bounds;
use crate::utils::errors::{bad_request_error, not_found_error, AppError, AppResult};
use crate::utils::validation::is_safe_filename;

/// Resultado de una generación: factura creada o aviso de periodo vacío
#[derive(Debug)]
pub enum GenerationOutcome {
    Generated(GeneratedInvoiceResponse),
    NothingToInvoice(String),
}

/// Totales de las líneas de una factura mensual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthlyTotals {
    pub amount: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

/// Línea de factura mensual a partir de un servicio
pub fn monthly_item(detail: &ServiceDetail) -> NewMonthlyInvoiceItem {
    let service = &detail.service;
    let client_name = match detail.client_name().trim() {
        "" => "Unknown Client".to_string(),
        name => name.to_string(),
    };
    let hotel_or_tour_name = if service.is_accommodation() {
        service.hotel_name.clone().or_else(|| Some(service.service_name.clone()))
    } else {
        Some(service.service_name.clone())
    };

    NewMonthlyInvoiceItem {
        service_id: Some(service.id),
        client_name,
        arrival_date: Some(detail.booking_start_date),
        service_type: service.service_type.clone(),
        service_name: service.service_name.clone(),
        service_date: service.start_date,
        cost_price: service.total_cost(),
        selling_price: service.total_selling_price(),
        profit: service.profit(),
        nights_or_hours: Some(service.nights_or_hours()),
        city: service.hotel_city.clone(),
        hotel_or_tour_name,
    }
}

pub fn monthly_totals(items: &[NewMonthlyInvoiceItem]) -> MonthlyTotals {
    items.iter().fold(MonthlyTotals::default(), |acc, item| MonthlyTotals {
        amount: acc.amount + item.selling_price,
        cost: acc.cost + item.cost_price,
        profit: acc.profit + item.profit,
    })
}

/// Validar la petición de factura mensual: `(empresa, mes, año, tipo)`
pub fn validate_monthly_request(
    request: &MonthlyInvoiceRequest,
) -> AppResult<(Uuid, u32, i32, MonthlyInvoiceType)> {
    let (Some(company_id), Some(month), Some(year)) = (request.company_id, request.month, request.year) else {
        return Err(bad_request_error("Company ID, month, and year are required"));
    };
    if !(1..=12).contains(&month) {
        return Err(bad_request_error("Month must be between 1 and 12"));
    }
    let invoice_type = match request.invoice_type.as_deref() {
        Some(raw) => raw.parse::<MonthlyInvoiceType>().map_err(bad_request_error)?,
        None => MonthlyInvoiceType::default(),
    };
    Ok((company_id, month, year, invoice_type))
}

/// Identificador del listado unificado: `<uuid>` o `monthly_<uuid>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceRef {
    Client(Uuid),
    Monthly(Uuid),
}

impl InvoiceRef {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let invalid = || bad_request_error("Invalid invoice id");
        match raw.strip_prefix("monthly_") {
            Some(rest) => Uuid::parse_str(rest).map(InvoiceRef::Monthly).map_err(|_| invalid()),
            None => Uuid::parse_str(raw).map(InvoiceRef::Client).map_err(|_| invalid()),
        }
    }
}

pub struct InvoiceController {
    repository: InvoiceRepository,
    companies: CompanyRepository,
    clients: ClientRepository,
    services: ServiceRepository,
    settings: SettingsRepository,
    invoices_dir: PathBuf,
    default_company_name: String,
}

impl InvoiceController {
    pub fn new(pool: PgPool, config: &EnvironmentConfig) -> Self {
        Self {
            repository: InvoiceRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            clients: ClientRepository::new(pool.clone()),
            services: ServiceRepository::new(pool.clone()),
            settings: SettingsRepository::new(pool),
            invoices_dir: config.invoices_dir.clone(),
            default_company_name: config.default_company_name.clone(),
        }
    }

    /// Facturas de cliente seguidas de las mensuales
    pub async fn list(&self) -> Result<Vec<InvoiceListEntry>, AppError> {
        let mut entries: Vec<InvoiceListEntry> = self
            .repository
            .list_client_invoices()
            .await?
            .into_iter()
            .map(InvoiceListEntry::from)
            .collect();

        let monthly = self.repository.list_monthly().await?;
        tracing::debug!("🧾 {} facturas de cliente, {} mensuales", entries.len(), monthly.len());
        entries.extend(monthly.iter().map(InvoiceListEntry::from));
        Ok(entries)
    }

    pub async fn monthly_with_items(&self) -> Result<Vec<MonthlyInvoiceResponse>, AppError> {
        let invoices = self.repository.list_monthly().await?;
        let ids: Vec<Uuid> = invoices.iter().map(|m| m.invoice.id).collect();

        let mut items_by_invoice: HashMap<Uuid, Vec<_>> = HashMap::new();
        for item in self.repository.items_of(&ids).await? {
            items_by_invoice.entry(item.monthly_invoice_id).or_default().push(item);
        }

        Ok(invoices
            .into_iter()
            .map(|row| {
                let items = items_by_invoice.remove(&row.invoice.id).unwrap_or_default();
                MonthlyInvoiceResponse::new(row, items)
            })
            .collect())
    }

    pub async fn generate_monthly(
        &self,
        request: MonthlyInvoiceRequest,
    ) -> Result<GenerationOutcome, AppError> {
        let (company_id, month, year, invoice_type) = validate_monthly_request(&request)?;

        let company = self
            .companies
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| not_found_error("Company"))?;

        if self.repository.monthly_exists(company_id, month, year).await? {
            tracing::info!("🧾 Ya existe factura para {} en {}/{}", company.name, month, year);
            return Err(AppError::Conflict(
                "Invoice for this company and period already exists".to_string(),
            ));
        }

        let (from, until) = month_bounds(year, month).ok_or_else(|| bad_request_error("Invalid period"))?;
        let details = self
            .services
            .details_for_company_between(company_id, from, until)
            .await?;
        if details.is_empty() {
            return Ok(GenerationOutcome::NothingToInvoice(
                "No services found for this company in the specified period".to_string(),
            ));
        }

        let items: Vec<NewMonthlyInvoiceItem> = details.iter().map(monthly_item).collect();
        let totals = monthly_totals(&items);
        let invoice = self
            .repository
            .create_monthly(
                &NewMonthlyInvoice {
                    company_id,
                    month,
                    year,
                    invoice_date: today(),
                    invoice_type,
                    total_amount: totals.amount,
                    total_cost: totals.cost,
                    total_profit: totals.profit,
                },
                &items,
            )
            .await?;
        tracing::info!(
            "🧾 Factura mensual {} creada: {} líneas, total {}",
            invoice.id,
            items.len(),
            totals.amount
        );

        let header = self.settings.company_name(&self.default_company_name).await?;
        let doc = monthly_invoice_document(
            &header,
            invoice_type,
            &MonthlyInvoiceInput {
                invoice: &invoice,
                company: &company,
                items: &items,
            },
        );
        let filename = monthly_invoice_filename(&company.name, month, year, invoice_type);

        match write_invoice(&self.invoices_dir, &filename, &doc).await {
            Ok(_) => {
                let pdf_path = download_path(&filename);
                self.repository.set_monthly_pdf(invoice.id, &pdf_path).await?;
                Ok(GenerationOutcome::Generated(GeneratedInvoiceResponse {
                    message: "Monthly invoice generated successfully".to_string(),
                    id: invoice.id,
                    pdf_path: Some(pdf_path),
                }))
            }
            Err(e) => {
                tracing::error!("❌ PDF de la factura mensual {} no generado: {}", invoice.id, e);
                Ok(GenerationOutcome::Generated(GeneratedInvoiceResponse {
                    message: "Monthly invoice generated, but PDF could not be created.".to_string(),
                    id: invoice.id,
                    pdf_path: None,
                }))
            }
        }
    }

    pub async fn generate_for_client(
        &self,
        client_id: Uuid,
        request: ClientInvoiceRequest,
    ) -> Result<GenerationOutcome, AppError> {
        let client = self
            .clients
            .find_by_id(client_id)
            .await?
            .ok_or_else(|| not_found_error("Client"))?;

        let period = match (request.month, request.year) {
            (Some(month), Some(year)) => Some((month, year)),
            _ => None,
        };
        let details = match period {
            Some((month, year)) => {
                let (from, until) =
                    month_bounds(year, month).ok_or_else(|| bad_request_error("Invalid period"))?;
                self.services.details_for_client_between(client_id, from, until).await?
            }
            None => self.services.details_for_client(client_id).await?,
        };
        tracing::info!("🧾 Factura de cliente {}: {} servicios", client_id, details.len());

        let Some(first) = details.first() else {
            return Ok(GenerationOutcome::NothingToInvoice(
                "No services found for this client in the specified period".to_string(),
            ));
        };
        let booking_id = first.service.booking_id;

        let client_name = match client.full_name().trim() {
            "" => "Unknown Client".to_string(),
            name => name.to_string(),
        };
        let header = self.settings.company_name(&self.default_company_name).await?;
        let invoice_date = today();
        let doc = client_invoice_document(
            &header,
            &ClientInvoiceInput {
                client_id,
                client_name: &client_name,
                email: client.email.as_deref(),
                invoice_date,
                services: &details,
            },
        );

        let filename = client_invoice_filename(&client_name, client_id, period);
        write_invoice(&self.invoices_dir, &filename, &doc)
            .await
            .map_err(|e| {
                tracing::error!("❌ PDF de cliente {} no generado: {}", client_id, e);
                AppError::Internal("Client invoice could not be created.".to_string())
            })?;

        let total: Decimal = details.iter().map(|d| d.service.total_selling_price()).sum();
        let pdf_path = download_path(&filename);
        let invoice = self
            .repository
            .create_client_invoice(booking_id, total, invoice_date, &pdf_path)
            .await?;

        Ok(GenerationOutcome::Generated(GeneratedInvoiceResponse {
            message: "Client invoice generated successfully".to_string(),
            id: invoice.id,
            pdf_path: Some(pdf_path),
        }))
    }

    /// Contenido del PDF guardado
    pub async fn download(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        if !is_safe_filename(filename) {
            return Err(bad_request_error("Invalid filename"));
        }
        match tokio::fs::read(self.invoices_dir.join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found_error("File")),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, reference: InvoiceRef) -> Result<(), AppError> {
        match reference {
            InvoiceRef::Client(id) => {
                let invoice = self
                    .repository
                    .find_client_invoice(id)
                    .await?
                    .ok_or_else(|| not_found_error("Invoice"))?;
                self.remove_pdf(invoice.pdf_path.as_deref()).await;
                self.repository.delete_client_invoice(id).await?;
            }
            InvoiceRef::Monthly(id) => {
                let invoice = self
                    .repository
                    .find_monthly(id)
                    .await?
                    .ok_or_else(|| not_found_error("Invoice"))?;
                self.remove_pdf(invoice.pdf_path.as_deref()).await;
                self.repository.delete_monthly(id).await?;
            }
        }
        tracing::info!("🗑️ Factura {:?} eliminada", reference);
        Ok(())
    }

    async fn remove_pdf(&self, pdf_path: Option<&str>) {
        let Some(filename) = pdf_path.and_then(|p| p.rsplit('/').next()) else {
            return;
        };
        if !is_safe_filename(filename) {
            return;
        }
        match tokio::fs::remove_file(self.invoices_dir.join(filename)).await {
            Ok(()) => tracing::info!("🗑️ PDF eliminado: {}", filename),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("⚠️ No se pudo eliminar el PDF {}: {}", filename, e),
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::fixtures::{detail, service};
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_monthly_request() {
        let missing = MonthlyInvoiceRequest {
            company_id: Some(Uuid::new_v4()),
            month: None,
            year: Some(2024),
            invoice_type: None,
        };
        match validate_monthly_request(&missing) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Company ID, month, and year are required"),
            other => panic!("unexpected: {:?}", other),
        }

        let bad_month = MonthlyInvoiceRequest {
            month: Some(13),
            ..missing
        };
        assert!(matches!(validate_monthly_request(&bad_month), Err(AppError::BadRequest(_))));

        let internal = MonthlyInvoiceRequest {
            month: Some(4),
            invoice_type: Some("my_company".to_string()),
            ..bad_month
        };
        let (_, month, year, kind) = validate_monthly_request(&internal).unwrap();
        assert_eq!((month, year, kind), (4, 2024, MonthlyInvoiceType::MyCompany));

        let unknown = MonthlyInvoiceRequest {
            invoice_type: Some("client".to_string()),
            ..internal
        };
        assert!(validate_monthly_request(&unknown).is_err());
    }

    #[test]
    fn test_monthly_items_and_totals() {
        let client_id = Uuid::new_v4();
        let mut hotel = service("Hotel");
        hotel.hotel_name = Some("Pera Palace".to_string());
        hotel.hotel_city = Some("Istanbul".to_string());
        hotel.num_nights = Some(2);
        hotel.cost_per_night = Some(dec!(60));
        hotel.selling_price_per_night = Some(dec!(90));
        let mut tour = service("Tour");
        tour.cost_to_company = Some(dec!(30));
        tour.selling_price = Some(dec!(50));

        let items: Vec<_> = [hotel, tour]
            .into_iter()
            .map(|s| monthly_item(&detail(s, client_id, "Ali Demir")))
            .collect();

        assert_eq!(items[0].client_name, "Ali Demir");
        assert_eq!(items[0].nights_or_hours.as_deref(), Some("2 Nights"));
        assert_eq!(items[0].hotel_or_tour_name.as_deref(), Some("Pera Palace"));
        assert_eq!(items[0].city.as_deref(), Some("Istanbul"));
        assert_eq!(items[1].nights_or_hours.as_deref(), Some("2024-05-10"));
        assert_eq!(items[1].hotel_or_tour_name.as_deref(), Some("Tour service"));

        let totals = monthly_totals(&items);
        assert_eq!(totals.amount, dec!(230));
        assert_eq!(totals.cost, dec!(150));
        assert_eq!(totals.profit, dec!(80));
    }

    #[test]
    fn test_invoice_ref_parse() {
        let id = Uuid::new_v4();
        assert_eq!(InvoiceRef::parse(&id.to_string()).unwrap(), InvoiceRef::Client(id));
        assert_eq!(
            InvoiceRef::parse(&format!("monthly_{}", id)).unwrap(),
            InvoiceRef::Monthly(id)
        );
        assert!(InvoiceRef::parse("monthly_42").is_err());
    }
}
