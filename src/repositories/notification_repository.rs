use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Notification;
use crate::utils::errors::AppError;

/// Registro de un envío ya intentado
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub driver_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub message: String,
    pub method: String,
    pub is_sent: bool,
}

pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: &NewNotification) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, driver_id, booking_id, message, notification_type, sent_at, is_sent)
            VALUES ($1, $2, $3, $4, $5, NOW(), $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.driver_id)
        .bind(new.booking_id)
        .bind(&new.message)
        .bind(&new.method)
        .bind(new.is_sent)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "🔔 Notificación {} registrada (enviada: {})",
            notification.id,
            notification.is_sent
        );
        Ok(notification)
    }

    /// Historial de un conductor, lo más reciente primero
    pub async fn list_for_driver(&self, driver_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE driver_id = $1 ORDER BY sent_at DESC",
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }
}
