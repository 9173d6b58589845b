use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{NewService, Service, ServiceDetail};
use crate::utils::errors::AppError;

/// Servicio unido a su reserva, cliente, conductor y vehículo
const DETAIL_SELECT: &str = r#"
    SELECT s.*,
           b.status AS booking_status,
           b.created_at AS booking_created_at,
           b.overall_start_date AS booking_start_date,
           c.id AS client_id,
           c.first_name AS client_first_name,
           c.last_name AS client_last_name,
           c.email AS client_email,
           c.company_id AS client_company_id,
           d.first_name AS driver_first_name,
           d.last_name AS driver_last_name,
           d.phone AS driver_phone,
           v.model AS vehicle_model,
           v.plate_number AS vehicle_plate
    FROM services s
    JOIN bookings b ON b.id = s.booking_id
    JOIN clients c ON c.id = b.client_id
    LEFT JOIN drivers d ON d.id = s.driver_id
    LEFT JOIN vehicles v ON v.id = s.vehicle_id
"#;

fn detail_query(filter: &str) -> String {
    format!("{} {}", DETAIL_SELECT, filter)
}

pub struct ServiceRepository {
    pool: PgPool,
}

impl ServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_bookings(&self, booking_ids: &[Uuid]) -> Result<Vec<Service>, AppError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE booking_id = ANY($1) ORDER BY start_date, created_at",
        )
        .bind(booking_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Servicios de un cliente, reserva más reciente primero
    pub async fn details_for_client(&self, client_id: Uuid) -> Result<Vec<ServiceDetail>, AppError> {
        let sql = detail_query("WHERE c.id = $1 ORDER BY b.created_at DESC, s.start_date");
        let rows = sqlx::query_as::<_, ServiceDetail>(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Servicios de un cliente que empiezan en `[from, until)`
    pub async fn details_for_client_between(
        &self,
        client_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ServiceDetail>, AppError> {
        let sql = detail_query(
            "WHERE c.id = $1 AND s.start_date >= $2 AND s.start_date < $3 ORDER BY s.start_date",
        );
        let rows = sqlx::query_as::<_, ServiceDetail>(&sql)
            .bind(client_id)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn details_for_company(&self, company_id: Uuid) -> Result<Vec<ServiceDetail>, AppError> {
        let sql = detail_query("WHERE c.company_id = $1 ORDER BY c.last_name, s.start_date");
        let rows = sqlx::query_as::<_, ServiceDetail>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Servicios de clientes de la empresa que empiezan en `[from, until)`
    pub async fn details_for_company_between(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ServiceDetail>, AppError> {
        let sql = detail_query(
            r#"WHERE c.company_id = $1 AND s.start_date >= $2 AND s.start_date < $3
               ORDER BY c.last_name, c.first_name, s.start_date"#,
        );
        let rows = sqlx::query_as::<_, ServiceDetail>(&sql)
            .bind(company_id)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Servicios de reservas que empiezan en `[from, until)` con estado en `statuses`
    pub async fn details_for_bookings_starting_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
        statuses: &[&str],
    ) -> Result<Vec<ServiceDetail>, AppError> {
        let sql = detail_query(
            r#"WHERE b.overall_start_date >= $1 AND b.overall_start_date < $2 AND b.status = ANY($3)
               ORDER BY b.overall_start_date, b.id, s.start_date"#,
        );
        let rows = sqlx::query_as::<_, ServiceDetail>(&sql)
            .bind(from)
            .bind(until)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn find_by_types(&self, service_types: &[&str]) -> Result<Vec<Service>, AppError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE service_type = ANY($1) ORDER BY start_date",
        )
        .bind(service_types)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Servicios que empiezan en `date` con la reserva en alguno de `statuses`
    pub async fn details_starting_on(
        &self,
        date: NaiveDate,
        statuses: &[&str],
    ) -> Result<Vec<ServiceDetail>, AppError> {
        let sql = detail_query("WHERE s.start_date = $1 AND b.status = ANY($2) ORDER BY s.start_time NULLS LAST");
        let rows = sqlx::query_as::<_, ServiceDetail>(&sql)
            .bind(date)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn details_for_company_starting_on(
        &self,
        company_id: Uuid,
        date: NaiveDate,
        statuses: &[&str],
    ) -> Result<Vec<ServiceDetail>, AppError> {
        let sql = detail_query(
            "WHERE c.company_id = $1 AND s.start_date = $2 AND b.status = ANY($3) ORDER BY s.service_type",
        );
        let rows = sqlx::query_as::<_, ServiceDetail>(&sql)
            .bind(company_id)
            .bind(date)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Servicios de un vehículo contenidos en `[from, until]`
    pub async fn details_for_vehicle_between(
        &self,
        vehicle_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
        statuses: &[&str],
    ) -> Result<Vec<ServiceDetail>, AppError> {
        let sql = detail_query(
            r#"WHERE s.vehicle_id = $1 AND s.start_date >= $2 AND s.end_date <= $3
               AND b.status = ANY($4) ORDER BY s.start_date"#,
        );
        let rows = sqlx::query_as::<_, ServiceDetail>(&sql)
            .bind(vehicle_id)
            .bind(from)
            .bind(until)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Servicios con vehículo que terminan en `since` o después
    pub async fn vehicle_details_from(
        &self,
        since: NaiveDate,
        statuses: &[&str],
    ) -> Result<Vec<ServiceDetail>, AppError> {
        let sql = detail_query(
            "WHERE s.vehicle_id IS NOT NULL AND s.end_date >= $1 AND b.status = ANY($2) ORDER BY s.start_date",
        );
        let rows = sqlx::query_as::<_, ServiceDetail>(&sql)
            .bind(since)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

/// Insertar los servicios de una reserva dentro de la transacción en curso
pub async fn insert_services(
    conn: &mut PgConnection,
    booking_id: Uuid,
    services: &[NewService],
) -> Result<(), AppError> {
    for service in services {
        sqlx::query(
            r#"
            INSERT INTO services (
                id, booking_id, driver_id, vehicle_id, service_type, service_name,
                start_date, end_date, start_time, end_time, cost_to_company, selling_price,
                hotel_name, hotel_city, room_type, num_nights, cost_per_night,
                selling_price_per_night, is_hourly, hours, with_driver, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(service.driver_id)
        .bind(service.vehicle_id)
        .bind(service.service_type.as_str())
        .bind(&service.service_name)
        .bind(service.start_date)
        .bind(service.end_date)
        .bind(service.start_time)
        .bind(service.end_time)
        .bind(service.cost_to_company)
        .bind(service.selling_price)
        .bind(&service.hotel_name)
        .bind(&service.hotel_city)
        .bind(&service.room_type)
        .bind(service.num_nights)
        .bind(service.cost_per_night)
        .bind(service.selling_price_per_night)
        .bind(service.is_hourly)
        .bind(service.hours)
        .bind(service.with_driver)
        .bind(&service.notes)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Borrar los servicios de una reserva y las líneas de factura mensual que los citan
pub async fn delete_services_of_booking(conn: &mut PgConnection, booking_id: Uuid) -> Result<u64, AppError> {
    sqlx::query(
        "DELETE FROM monthly_invoice_items WHERE service_id IN (SELECT id FROM services WHERE booking_id = $1)",
    )
    .bind(booking_id)
    .execute(&mut *conn)
    .await?;

    let deleted = sqlx::query("DELETE FROM services WHERE booking_id = $1")
        .bind(booking_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(deleted)
}
