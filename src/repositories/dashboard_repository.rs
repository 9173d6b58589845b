use sqlx::PgPool;

use crate::utils::errors::AppError;

/// Totales de cada tabla principal
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct TableCounts {
    pub clients: i64,
    pub drivers: i64,
    pub vehicles: i64,
    pub bookings: i64,
}

pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn table_counts(&self) -> Result<TableCounts, AppError> {
        let counts = sqlx::query_as::<_, TableCounts>(
            r#"
            SELECT (SELECT COUNT(*) FROM clients) AS clients,
                   (SELECT COUNT(*) FROM drivers) AS drivers,
                   (SELECT COUNT(*) FROM vehicles) AS vehicles,
                   (SELECT COUNT(*) FROM bookings) AS bookings
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    pub async fn count_clients(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn booking_status_breakdown(&self) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM bookings GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn service_type_breakdown(&self) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT service_type, COUNT(*) FROM services GROUP BY service_type ORDER BY service_type",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
