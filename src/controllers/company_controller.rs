use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::company_dto::{
    CompanyClientEntry, CompanyClientService, CompanyClientsDetailedResponse, CompanyClientsResponse,
    CompanyHeader, CompanyRequest, CompanyResponse, DetailedClientEntry, DetailedServiceEntry, PeriodEcho,
    PeriodQuery,
};
use crate::models::ServiceDetail;
use crate::repositories::client_repository::ClientRepository;
use crate::repositories::company_repository::{CompanyFields, CompanyRepository};
use crate::repositories::service_repository::ServiceRepository;
use crate::utils::errors::{bad_request_error, not_found_error, AppError};

const REQUIRED_MESSAGE: &str = "Company name, contact person, and email are required";

pub struct CompanyController {
    repository: CompanyRepository,
    clients: ClientRepository,
    services: ServiceRepository,
}

impl CompanyController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CompanyRepository::new(pool.clone()),
            clients: ClientRepository::new(pool.clone()),
            services: ServiceRepository::new(pool),
        }
    }

    pub async fn list(&self) -> Result<Vec<CompanyResponse>, AppError> {
        let companies = self.repository.list().await?;
        Ok(companies.into_iter().map(CompanyResponse::from).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<CompanyResponse, AppError> {
        self.repository
            .find_with_count(id)
            .await?
            .map(CompanyResponse::from)
            .ok_or_else(|| not_found_error("Company"))
    }

    pub async fn create(&self, request: CompanyRequest) -> Result<CompanyResponse, AppError> {
        let fields = self.validated_fields(request, None).await?;
        let company = self.repository.create(fields).await?;
        tracing::info!("🏢 Empresa creada: {} ({})", company.name, company.id);
        self.get_by_id(company.id).await
    }

    pub async fn update(&self, id: Uuid, request: CompanyRequest) -> Result<CompanyResponse, AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Company"));
        }
        let fields = self.validated_fields(request, Some(id)).await?;
        self.repository
            .update(id, fields)
            .await?
            .ok_or_else(|| not_found_error("Company"))?;
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Company"));
        }
        let client_count = self.repository.count_clients(id).await?;
        if client_count > 0 {
            return Err(bad_request_error(format!(
                "Cannot delete company with {} associated clients",
                client_count
            )));
        }
        self.repository.delete(id).await?;
        Ok(())
    }

    /// Clientes de la empresa con todos sus servicios
    pub async fn clients(&self, id: Uuid) -> Result<CompanyClientsResponse, AppError> {
        let company = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Company"))?;
        let clients = self.clients.find_by_company(id).await?;
        let details = self.services.details_for_company(id).await?;

        let mut by_client: BTreeMap<Uuid, Vec<&ServiceDetail>> = BTreeMap::new();
        for detail in &details {
            by_client.entry(detail.client_id).or_default().push(detail);
        }

        let entries = clients
            .into_iter()
            .map(|client| {
                let services: Vec<CompanyClientService> = by_client
                    .get(&client.id)
                    .map(|rows| {
                        rows.iter()
                            .map(|d| CompanyClientService {
                                service_name: d.service.service_name.clone(),
                                service_type: d.service.service_type.clone(),
                                start_date: d.service.start_date,
                                total_selling_price: d.service.total_selling_price(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let total_amount = services.iter().map(|s| s.total_selling_price).sum();
                CompanyClientEntry {
                    client_id: client.id,
                    client_name: client.full_name(),
                    email: client.email,
                    services,
                    total_amount,
                }
            })
            .collect();

        Ok(CompanyClientsResponse {
            company: CompanyHeader::from(&company),
            clients: entries,
        })
    }

    /// Detalle por cliente para preparar la factura mensual
    pub async fn clients_detailed(
        &self,
        id: Uuid,
        query: PeriodQuery,
    ) -> Result<CompanyClientsDetailedResponse, AppError> {
        let company = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Company"))?;
        let details = self.services.details_for_company(id).await?;

        let period = match (query.month, query.year) {
            (Some(month), Some(year)) => Some(PeriodEcho { month, year }),
            _ => None,
        };
        let (clients, total_revenue) = group_detailed(&details, period.as_ref());

        Ok(CompanyClientsDetailedResponse {
            company: CompanyHeader::from(&company),
            clients,
            total_revenue,
            period,
        })
    }

    async fn validated_fields(
        &self,
        request: CompanyRequest,
        exclude_id: Option<Uuid>,
    ) -> Result<CompanyFields, AppError> {
        let (Some(name), Some(contact_person), Some(email)) =
            (request.name.clone(), request.contact_person.clone(), request.email.clone())
        else {
            return Err(bad_request_error(REQUIRED_MESSAGE));
        };
        request.validate()?;

        if self.repository.name_exists(&name, exclude_id).await? {
            return Err(bad_request_error("Company name already exists"));
        }
        if self.repository.email_exists(&email, exclude_id).await? {
            return Err(bad_request_error("Company email already exists"));
        }

        Ok(CompanyFields {
            name,
            contact_person,
            email,
            phone: request.phone,
            address: request.address,
            logo_path: request.logo_path,
        })
    }
}

/// Agrupar servicios por cliente, filtrando por el mes de creación de la reserva
fn group_detailed(
    details: &[ServiceDetail],
    period: Option<&PeriodEcho>,
) -> (Vec<DetailedClientEntry>, Decimal) {
    let mut grouped: BTreeMap<Uuid, DetailedClientEntry> = BTreeMap::new();

    for detail in details {
        if let Some(p) = period {
            let created = detail.booking_created_at.date_naive();
            if created.month() != p.month || created.year() != p.year {
                continue;
            }
        }
        let entry = grouped.entry(detail.client_id).or_insert_with(|| DetailedClientEntry {
            client_id: detail.client_id,
            client_name: detail.client_name(),
            email: detail.client_email.clone(),
            arrival_date: detail.booking_start_date,
            services: Vec::new(),
            total_selling_price: Decimal::ZERO,
        });
        entry.arrival_date = entry.arrival_date.min(detail.booking_start_date);
        entry.total_selling_price += detail.service.total_selling_price();
        entry.services.push(DetailedServiceEntry::from(detail));
    }

    let clients: Vec<DetailedClientEntry> = grouped.into_values().collect();
    let total = clients.iter().map(|c| c.total_selling_price).sum();
    (clients, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::fixtures::{detail, service};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_group_detailed_sums_per_client() {
        let ali = Uuid::new_v4();
        let mut hotel = service("Hotel");
        hotel.num_nights = Some(2);
        hotel.selling_price_per_night = Some(dec!(100));
        hotel.hotel_city = Some("Istanbul".to_string());
        let mut tour = service("Tour");
        tour.selling_price = Some(dec!(50));

        let mut early = detail(tour, ali, "Ali Veli");
        early.booking_start_date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let rows = vec![detail(hotel, ali, "Ali Veli"), early];

        let (clients, total) = group_detailed(&rows, None);
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].client_name, "Ali Veli");
        assert_eq!(clients[0].arrival_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(clients[0].total_selling_price, dec!(250));
        assert_eq!(clients[0].services[0].service_category, "Hotels");
        assert_eq!(clients[0].services[0].city.as_deref(), Some("Istanbul"));
        assert_eq!(clients[0].services[1].service_category, "Tours and Car Rentals");
        assert_eq!(total, dec!(250));
    }

    #[test]
    fn test_group_detailed_filters_by_booking_month() {
        let rows = vec![detail(service("Tour"), Uuid::new_v4(), "Ayse Kaya")];
        let other_month = PeriodEcho { month: 1, year: 1999 };
        let (clients, total) = group_detailed(&rows, Some(&other_month));
        assert!(clients.is_empty());
        assert_eq!(total, Decimal::ZERO);
    }
}
