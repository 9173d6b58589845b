use serde::de::DeserializeOwned;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Setting;
use crate::utils::errors::AppError;

pub const COMPANY_NAME: &str = "company_name";
pub const META_WHATSAPP: &str = "meta_whatsapp_settings";
pub const ADMIN_PHONES: &str = "admin_phone_numbers";
pub const EMAIL_SETTINGS: &str = "email_settings";

pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Setting>, AppError> {
        let settings = sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(settings)
    }

    pub async fn find(&self, key: &str) -> Result<Option<Setting>, AppError> {
        let setting = sqlx::query_as::<_, Setting>("SELECT * FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(setting)
    }

    /// Valor JSON de un ajuste deserializado a `T`; `None` si falta o no encaja
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let Some(setting) = self.find(key).await? else {
            return Ok(None);
        };
        match serde_json::from_value(setting.json_value()) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("⚠️ Ajuste {} con formato inesperado: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Nombre de la empresa para las cabeceras; `fallback` si no está configurado
    pub async fn company_name(&self, fallback: &str) -> Result<String, AppError> {
        let name = self
            .find(COMPANY_NAME)
            .await?
            .map(|s| s.value.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(name.unwrap_or_else(|| fallback.to_string()))
    }

    pub async fn upsert(&self, key: &str, value: &str) -> Result<Setting, AppError> {
        let mut conn = self.pool.acquire().await?;
        upsert_setting(&mut *conn, key, value).await
    }

    /// Restaurar varios ajustes en una transacción
    pub async fn upsert_many(&self, entries: &[(String, String)]) -> Result<usize, AppError> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            upsert_setting(&mut *tx, key, value).await?;
        }
        tx.commit().await?;

        tracing::info!("♻️ {} ajustes restaurados", entries.len());
        Ok(entries.len())
    }
}

async fn upsert_setting(conn: &mut PgConnection, key: &str, value: &str) -> Result<Setting, AppError> {
    let setting = sqlx::query_as::<_, Setting>(
        r#"
        INSERT INTO settings (id, key, value)
        VALUES ($1, $2, $3)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(key)
    .bind(value)
    .fetch_one(&mut *conn)
    .await?;

    Ok(setting)
}
