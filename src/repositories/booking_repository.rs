use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Booking, BookingWithClient, NewBooking, NewService};
use crate::repositories::service_repository::{delete_services_of_booking, insert_services};
use crate::utils::errors::AppError;

const WITH_CLIENT_SELECT: &str = r#"
    SELECT b.*,
           c.first_name AS client_first_name,
           c.last_name AS client_last_name
    FROM bookings b
    LEFT JOIN clients c ON c.id = b.client_id
"#;

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<BookingWithClient>, AppError> {
        let sql = format!("{} ORDER BY b.overall_start_date DESC, b.created_at DESC", WITH_CLIENT_SELECT);
        let bookings = sqlx::query_as::<_, BookingWithClient>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }

    pub async fn find_with_client(&self, id: Uuid) -> Result<Option<BookingWithClient>, AppError> {
        let sql = format!("{} WHERE b.id = $1", WITH_CLIENT_SELECT);
        let booking = sqlx::query_as::<_, BookingWithClient>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Reservas que empiezan en `[from, to]` con estado en `statuses`, las más próximas primero
    pub async fn starting_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        statuses: &[&str],
    ) -> Result<Vec<BookingWithClient>, AppError> {
        let sql = format!(
            "{} WHERE b.overall_start_date >= $1 AND b.overall_start_date <= $2 AND b.status = ANY($3) \
             ORDER BY b.overall_start_date ASC, b.created_at ASC",
            WITH_CLIENT_SELECT
        );
        let bookings = sqlx::query_as::<_, BookingWithClient>(&sql)
            .bind(from)
            .bind(to)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    /// Crear la reserva y sus servicios en una sola transacción
    pub async fn create(&self, booking: &NewBooking, services: &[NewService]) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (id, client_id, overall_start_date, overall_end_date, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking.client_id)
        .bind(booking.overall_start_date)
        .bind(booking.overall_end_date)
        .bind(&booking.notes)
        .bind(booking.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        insert_services(&mut *tx, created.id, services).await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Actualizar la reserva sustituyendo todos sus servicios
    pub async fn replace(
        &self,
        id: Uuid,
        booking: &NewBooking,
        services: &[NewService],
    ) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET client_id = $2, overall_start_date = $3, overall_end_date = $4, notes = $5, status = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(booking.client_id)
        .bind(booking.overall_start_date)
        .bind(booking.overall_end_date)
        .bind(&booking.notes)
        .bind(booking.status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            return Ok(None);
        };

        let removed = delete_services_of_booking(&mut *tx, id).await?;
        insert_services(&mut *tx, id, services).await?;

        tx.commit().await?;
        tracing::debug!("🔄 Reserva {}: {} servicios reemplazados por {}", id, removed, services.len());
        Ok(Some(updated))
    }

    /// Borrar la reserva con facturas, notificaciones y servicios
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        delete_dependents(&mut *tx, id).await?;

        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn delete_dependents(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
    let invoices = sqlx::query("DELETE FROM invoices WHERE booking_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let notifications = sqlx::query("DELETE FROM notifications WHERE booking_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let services = delete_services_of_booking(&mut *conn, id).await?;

    tracing::info!(
        "🗑️ Reserva {}: {} facturas, {} notificaciones, {} servicios eliminados",
        id,
        invoices,
        notifications,
        services
    );
    Ok(())
}
