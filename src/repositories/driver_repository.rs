use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Driver, Vehicle};
use crate::utils::errors::AppError;

/// Campos editables de un conductor
#[derive(Debug, Clone)]
pub struct DriverFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
}

pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Driver>, AppError> {
        let drivers = sqlx::query_as::<_, Driver>("SELECT * FROM drivers ORDER BY first_name, last_name")
            .fetch_all(&self.pool)
            .await?;

        Ok(drivers)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Driver>, AppError> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(driver)
    }

    /// Conductores sin ningún vehículo asignado
    pub async fn list_unassigned(&self) -> Result<Vec<Driver>, AppError> {
        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT d.* FROM drivers d
            WHERE NOT EXISTS (SELECT 1 FROM vehicles v WHERE v.assigned_driver_id = d.id)
            ORDER BY d.first_name, d.last_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(drivers)
    }

    /// Vehículos asignados a cualquiera de `driver_ids`
    pub async fn vehicles_of(&self, driver_ids: &[Uuid]) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE assigned_driver_id = ANY($1) ORDER BY model",
        )
        .bind(driver_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    pub async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM drivers WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn license_exists(&self, license: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM drivers WHERE license_number = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(license)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn create(&self, fields: DriverFields) -> Result<Driver, AppError> {
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (id, first_name, last_name, email, phone, license_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(fields.first_name)
        .bind(fields.last_name)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.license_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(driver)
    }

    pub async fn update(&self, id: Uuid, fields: DriverFields) -> Result<Option<Driver>, AppError> {
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            UPDATE drivers
            SET first_name = $2, last_name = $3, email = $4, phone = $5, license_number = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.first_name)
        .bind(fields.last_name)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.license_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(driver)
    }

    /// Servicios del conductor en reservas pendientes o confirmadas
    pub async fn count_active_services(&self, id: Uuid, statuses: &[&str]) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM services s
            JOIN bookings b ON b.id = s.booking_id
            WHERE s.driver_id = $1 AND b.status = ANY($2)
            "#,
        )
        .bind(id)
        .bind(statuses)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Reasignar la flota del conductor: libera la actual y asigna `vehicle_ids`
    pub async fn replace_vehicles(&self, id: Uuid, vehicle_ids: &[Uuid]) -> Result<Vec<Vehicle>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE vehicles SET assigned_driver_id = NULL WHERE assigned_driver_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let assigned = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET assigned_driver_id = $1 WHERE id = ANY($2) RETURNING *",
        )
        .bind(id)
        .bind(vehicle_ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(assigned)
    }

    /// Borrar el conductor soltando vehículos, servicios y notificaciones
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        detach_driver(&mut *tx, id).await?;

        let result = sqlx::query("DELETE FROM drivers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Referencias que se sueltan antes de borrar un conductor
const DETACH_DRIVER_STATEMENTS: [&str; 3] = [
    "UPDATE vehicles SET assigned_driver_id = NULL WHERE assigned_driver_id = $1",
    "UPDATE services SET driver_id = NULL WHERE driver_id = $1",
    "UPDATE notifications SET driver_id = NULL WHERE driver_id = $1",
];

async fn detach_driver(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
    for sql in DETACH_DRIVER_STATEMENTS {
        sqlx::query(sql).bind(id).execute(&mut *conn).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_detaches_every_driver_reference() {
        for column in [
            "vehicles SET assigned_driver_id = NULL",
            "services SET driver_id = NULL",
            "notifications SET driver_id = NULL",
        ] {
            assert!(
                DETACH_DRIVER_STATEMENTS.iter().any(|sql| sql.contains(column)),
                "falta soltar {}",
                column
            );
        }
        // Todas filtran por el conductor borrado
        assert!(DETACH_DRIVER_STATEMENTS.iter().all(|sql| sql.ends_with("= $1")));
    }
}
