use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::client_dto::{
    ClientBookingGroups, ClientBookingsResponse, ClientHeader, ClientRequest, ClientResponse,
    ClientServiceEntry, PaymentRequest,
};
use crate::models::client::PAYMENT_STATUSES;
use crate::models::{ServiceDetail, ServiceType};
use crate::repositories::client_repository::{ClientFields, ClientRepository};
use crate::repositories::company_repository::CompanyRepository;
use crate::repositories::service_repository::ServiceRepository;
use crate::utils::errors::{bad_request_error, not_found_error, AppError};
use crate::utils::validation::{non_negative, parse_date, require_text};

/// Servicios agrupados en hoteles, tours y alquileres, con venta y beneficio totales
pub fn group_client_services(details: &[ServiceDetail]) -> (ClientBookingGroups, Decimal, Decimal) {
    let mut groups = ClientBookingGroups::default();
    let mut total_revenue = Decimal::ZERO;
    let mut total_profit = Decimal::ZERO;

    for detail in details {
        total_revenue += detail.service.total_selling_price();
        total_profit += detail.service.profit();
        let entry = ClientServiceEntry::from(detail);
        match detail.service.kind() {
            Some(kind) if kind.is_accommodation() => groups.hotels.push(entry),
            Some(ServiceType::Tour) => groups.tours.push(entry),
            Some(ServiceType::Vehicle) => groups.vehicle_rentals.push(entry),
            _ => {}
        }
    }

    (groups, total_revenue, total_profit)
}

pub struct ClientController {
    repository: ClientRepository,
    companies: CompanyRepository,
    services: ServiceRepository,
}

impl ClientController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClientRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            services: ServiceRepository::new(pool),
        }
    }

    pub async fn list(&self) -> Result<Vec<ClientResponse>, AppError> {
        let clients = self.repository.list().await?;
        Ok(clients.into_iter().map(ClientResponse::from).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ClientResponse, AppError> {
        self.repository
            .find_summary(id)
            .await?
            .map(ClientResponse::from)
            .ok_or_else(|| not_found_error("Client"))
    }

    pub async fn create(&self, request: ClientRequest) -> Result<ClientResponse, AppError> {
        let fields = self.validated_fields(request, None).await?;
        let client = self.repository.create(fields).await?;
        tracing::info!("👤 Cliente creado: {}", client.id);
        self.get_by_id(client.id).await
    }

    pub async fn update(&self, id: Uuid, request: ClientRequest) -> Result<ClientResponse, AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Client"));
        }
        let fields = self.validated_fields(request, Some(id)).await?;
        self.repository
            .update(id, fields)
            .await?
            .ok_or_else(|| not_found_error("Client"))?;
        self.get_by_id(id).await
    }

    pub async fn update_payment(&self, id: Uuid, request: PaymentRequest) -> Result<ClientResponse, AppError> {
        non_negative(request.paid_amount, "Paid amount must be non-negative")?;
        if !PAYMENT_STATUSES.contains(&request.payment_status.as_str()) {
            return Err(bad_request_error(format!(
                "Invalid payment status. Must be one of: {}",
                PAYMENT_STATUSES.join(", ")
            )));
        }
        let payment_date = request
            .payment_date
            .as_deref()
            .map(|d| parse_date(d, "Invalid payment date format. Use YYYY-MM-DD"))
            .transpose()?;

        self.repository
            .update_payment(id, request.paid_amount, &request.payment_status, payment_date)
            .await?
            .ok_or_else(|| not_found_error("Client"))?;
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Client"));
        }
        let booking_count = self.repository.count_bookings(id).await?;
        if booking_count > 0 {
            return Err(bad_request_error(format!(
                "Cannot delete client with {} existing bookings",
                booking_count
            )));
        }
        self.repository.delete(id).await?;
        Ok(())
    }

    /// Historial de reservas agrupado por tipo de servicio
    pub async fn bookings(&self, id: Uuid) -> Result<ClientBookingsResponse, AppError> {
        let summary = self
            .repository
            .find_summary(id)
            .await?
            .ok_or_else(|| not_found_error("Client"))?;
        let details = self.services.details_for_client(id).await?;

        let (groups, total_revenue, total_profit) = group_client_services(&details);

        let client = summary.client;
        Ok(ClientBookingsResponse {
            client: ClientHeader {
                id: client.id,
                first_name: client.first_name,
                last_name: client.last_name,
                email: client.email,
                phone: client.phone,
                company: summary.company_name.unwrap_or_else(|| "No Company".to_string()),
            },
            bookings: groups,
            total_bookings: summary.booking_count,
            total_revenue,
            total_profit,
        })
    }

    async fn validated_fields(
        &self,
        request: ClientRequest,
        exclude_id: Option<Uuid>,
    ) -> Result<ClientFields, AppError> {
        if request.first_name.is_none() || request.last_name.is_none() {
            return Err(bad_request_error("First name and last name are required"));
        }
        request.validate()?;

        if let Some(email) = request.email.as_deref() {
            if self.repository.email_exists(email, exclude_id).await? {
                return Err(bad_request_error("Email already exists"));
            }
        }
        if let Some(company_id) = request.company_id {
            if self.companies.find_by_id(company_id).await?.is_none() {
                return Err(bad_request_error("Company not found"));
            }
        }

        Ok(ClientFields {
            first_name: require_text(&request.first_name, "First name and last name are required")?,
            last_name: require_text(&request.last_name, "First name and last name are required")?,
            email: request.email,
            phone: request.phone,
            passport_number: request.passport_number,
            license_number: request.license_number,
            address: request.address,
            company_id: request.company_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::fixtures::{detail, service};
    use rust_decimal_macros::dec;

    #[test]
    fn test_group_client_services_by_type() {
        let mut hotel = service("Hotel");
        hotel.num_nights = Some(2);
        hotel.cost_per_night = Some(dec!(50));
        hotel.selling_price_per_night = Some(dec!(80));
        let mut cabin = service("Cabin");
        cabin.selling_price = Some(dec!(40));
        let mut tour = service("Tour");
        tour.cost_to_company = Some(dec!(30));
        tour.selling_price = Some(dec!(45));
        let mut rental = service("Vehicle");
        rental.selling_price = Some(dec!(25));
        let mut unknown = service("Cruise");
        unknown.selling_price = Some(dec!(10));

        let client_id = Uuid::new_v4();
        let details: Vec<_> = [hotel, cabin, tour, rental, unknown]
            .into_iter()
            .map(|s| detail(s, client_id, "Ali Demir"))
            .collect();

        let (groups, revenue, profit) = group_client_services(&details);
        assert_eq!(groups.hotels.len(), 2);
        assert_eq!(groups.tours.len(), 1);
        assert_eq!(groups.vehicle_rentals.len(), 1);
        assert_eq!(groups.hotels[0].service_type, "Hotel");
        assert_eq!(groups.hotels[1].service_type, "Cabin");
        // Los tipos desconocidos no se listan pero sí suman
        assert_eq!(revenue, dec!(280));
        assert_eq!(profit, dec!(150));
    }

    #[test]
    fn test_group_client_services_empty() {
        let (groups, revenue, profit) = group_client_services(&[]);
        assert!(groups.hotels.is_empty() && groups.tours.is_empty() && groups.vehicle_rentals.is_empty());
        assert_eq!(revenue, Decimal::ZERO);
        assert_eq!(profit, Decimal::ZERO);
    }
}
