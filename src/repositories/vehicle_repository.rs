use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Vehicle, VehicleOverview};
use crate::utils::errors::AppError;

const OVERVIEW_SELECT: &str = r#"
    SELECT v.*,
           d.first_name AS driver_first_name,
           d.last_name AS driver_last_name,
           (SELECT COUNT(*) FROM services s WHERE s.vehicle_id = v.id) AS total_bookings,
           (SELECT COUNT(*) FROM services s JOIN bookings b ON b.id = s.booking_id
             WHERE s.vehicle_id = v.id AND b.status IN ('pending', 'confirmed')) AS active_bookings,
           (SELECT COUNT(*) FROM services s JOIN bookings b ON b.id = s.booking_id
             WHERE s.vehicle_id = v.id AND b.status = 'completed') AS completed_bookings
    FROM vehicles v
    LEFT JOIN drivers d ON d.id = v.assigned_driver_id
"#;

/// Campos editables de un vehículo
#[derive(Debug, Clone)]
pub struct VehicleFields {
    pub model: String,
    pub plate_number: String,
    pub vehicle_type: String,
    pub capacity: i32,
    pub assigned_driver_id: Option<Uuid>,
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<VehicleOverview>, AppError> {
        let sql = format!("{} ORDER BY v.model, v.plate_number", OVERVIEW_SELECT);
        let vehicles = sqlx::query_as::<_, VehicleOverview>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles)
    }

    pub async fn find_overview(&self, id: Uuid) -> Result<Option<VehicleOverview>, AppError> {
        let sql = format!("{} WHERE v.id = $1", OVERVIEW_SELECT);
        let vehicle = sqlx::query_as::<_, VehicleOverview>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles)
    }

    /// Vehículo (distinto de `exclude_id`) que ya lleva a este conductor
    pub async fn find_by_driver(&self, driver_id: Uuid, exclude_id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE assigned_driver_id = $1 AND id <> $2 LIMIT 1",
        )
        .bind(driver_id)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn plate_exists(&self, plate_number: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE plate_number = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(plate_number)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn create(&self, fields: VehicleFields) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, model, plate_number, type, capacity, assigned_driver_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(fields.model)
        .bind(fields.plate_number)
        .bind(fields.vehicle_type)
        .bind(fields.capacity)
        .bind(fields.assigned_driver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn update(&self, id: Uuid, fields: VehicleFields) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET model = $2, plate_number = $3, type = $4, capacity = $5, assigned_driver_id = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.model)
        .bind(fields.plate_number)
        .bind(fields.vehicle_type)
        .bind(fields.capacity)
        .bind(fields.assigned_driver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn set_driver(&self, id: Uuid, driver_id: Option<Uuid>) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET assigned_driver_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn count_active_services(&self, id: Uuid, statuses: &[&str]) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM services s
            JOIN bookings b ON b.id = s.booking_id
            WHERE s.vehicle_id = $1 AND b.status = ANY($2)
            "#,
        )
        .bind(id)
        .bind(statuses)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Borrar el vehículo; los servicios históricos quedan sin vehículo
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE services SET vehicle_id = NULL WHERE vehicle_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
