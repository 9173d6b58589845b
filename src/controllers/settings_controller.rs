use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::dto::notification_dto::SendResultResponse;
use crate::dto::settings_dto::{
    AdminPhonesResponse, BackupResponse, EmailSettingsView, MetaWhatsappSettingsView, TestTemplateRequest,
};
use crate::models::notification::encode_setting_value;
use crate::models::{EmailSettings, MetaWhatsappSettings};
use crate::repositories::settings_repository::{self, SettingsRepository};
use crate::services::notification_service::SharedNotifier;
use crate::services::notification_templates::{format_template, NotificationKind, TemplateFields};
use crate::utils::errors::{bad_request_error, AppError};
use crate::utils::validation::normalize_admin_phone;

const TEST_WHATSAPP_MESSAGE: &str =
    "🧪 Meta WhatsApp Business API Test Mesajı\n\nBu bir test mesajıdır. API bağlantısı başarılı!";
const TEST_SEND_FAILED: &str = "Test mesajı gönderilemedi";

/// Un campo cuenta como presente si no es null, vacío, cero ni `false`
fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |n| n != 0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Exigir `fields` en orden, informando el primero que falta
pub fn require_fields(body: &Map<String, Value>, fields: &[&str]) -> Result<(), AppError> {
    match fields.iter().find(|field| !is_filled(body.get(**field))) {
        Some(field) => Err(bad_request_error(format!("Field {} is required", field))),
        None => Ok(()),
    }
}

/// Texto de un campo escalar; números y booleanos se convierten
fn text_field(body: &Map<String, Value>, key: &str) -> String {
    match body.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub fn meta_settings_from(body: &Map<String, Value>) -> Result<MetaWhatsappSettings, AppError> {
    require_fields(body, &["access_token", "phone_number_id", "app_id", "app_secret"])?;
    let api_version = match text_field(body, "api_version") {
        v if v.is_empty() => "v18.0".to_string(),
        v => v,
    };

    Ok(MetaWhatsappSettings {
        access_token: text_field(body, "access_token"),
        phone_number_id: text_field(body, "phone_number_id"),
        app_id: text_field(body, "app_id"),
        app_secret: text_field(body, "app_secret"),
        webhook_verify_token: text_field(body, "webhook_verify_token"),
        api_version,
    })
}

pub fn email_settings_from(body: &Map<String, Value>) -> Result<EmailSettings, AppError> {
    require_fields(body, &["smtp_server", "smtp_port", "username", "password"])?;
    let smtp_port = text_field(body, "smtp_port")
        .parse()
        .map_err(|_| bad_request_error("SMTP port must be a valid number"))?;

    Ok(EmailSettings {
        smtp_server: text_field(body, "smtp_server"),
        smtp_port,
        username: text_field(body, "username"),
        password: text_field(body, "password"),
    })
}

pub fn normalize_admin_phones(phones: &[String]) -> Vec<String> {
    phones.iter().filter_map(|p| normalize_admin_phone(p)).collect()
}

pub struct SettingsController {
    repository: SettingsRepository,
    notifier: SharedNotifier,
}

impl SettingsController {
    pub fn new(pool: PgPool, notifier: SharedNotifier) -> Self {
        Self {
            repository: SettingsRepository::new(pool),
            notifier,
        }
    }

    async fn all_values(&self) -> Result<Map<String, Value>, AppError> {
        let settings = self.repository.list().await?;
        Ok(settings.into_iter().map(|s| (s.key.clone(), s.json_value())).collect())
    }

    pub async fn list(&self) -> Result<Map<String, Value>, AppError> {
        self.all_values().await
    }

    /// `{key: valor}`; `null` si la clave no existe
    pub async fn get(&self, key: &str) -> Result<Map<String, Value>, AppError> {
        let value = self
            .repository
            .find(key)
            .await?
            .map(|s| s.json_value())
            .unwrap_or(Value::Null);

        let mut body = Map::new();
        body.insert(key.to_string(), value);
        Ok(body)
    }

    pub async fn update(&self, key: &str, value: &Value) -> Result<String, AppError> {
        self.repository.upsert(key, &encode_setting_value(value)).await?;
        tracing::info!("🔧 Ajuste {} actualizado", key);
        Ok(format!("Setting {} updated successfully", key))
    }

    async fn store_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(value).map_err(|e| bad_request_error(e.to_string()))?;
        self.repository.upsert(key, &encode_setting_value(&value)).await?;
        Ok(())
    }

    pub async fn meta_whatsapp(&self) -> Result<MetaWhatsappSettingsView, AppError> {
        let settings = self
            .repository
            .get_json::<MetaWhatsappSettings>(settings_repository::META_WHATSAPP)
            .await?;
        Ok(MetaWhatsappSettingsView::from(settings))
    }

    pub async fn update_meta_whatsapp(&self, body: &Map<String, Value>) -> Result<(), AppError> {
        let settings = meta_settings_from(body)?;
        self.store_json(settings_repository::META_WHATSAPP, &settings).await?;
        tracing::info!("📱 Ajustes de Meta WhatsApp actualizados");
        Ok(())
    }

    pub async fn admin_phones(&self) -> Result<AdminPhonesResponse, AppError> {
        let admin_phone_numbers = self
            .repository
            .get_json::<Vec<String>>(settings_repository::ADMIN_PHONES)
            .await?
            .unwrap_or_default();
        Ok(AdminPhonesResponse { admin_phone_numbers })
    }

    pub async fn update_admin_phones(&self, phones: &[String]) -> Result<(), AppError> {
        let phones = normalize_admin_phones(phones);
        self.store_json(settings_repository::ADMIN_PHONES, &phones).await?;
        tracing::info!("📞 {} teléfonos de administrador guardados", phones.len());
        Ok(())
    }

    pub async fn email(&self) -> Result<EmailSettingsView, AppError> {
        let settings = self
            .repository
            .get_json::<EmailSettings>(settings_repository::EMAIL_SETTINGS)
            .await?;
        Ok(EmailSettingsView::from(settings))
    }

    pub async fn update_email(&self, body: &Map<String, Value>) -> Result<(), AppError> {
        let settings = email_settings_from(body)?;
        self.store_json(settings_repository::EMAIL_SETTINGS, &settings).await?;
        tracing::info!("📧 Ajustes de correo actualizados");
        Ok(())
    }

    pub async fn test_whatsapp(&self, test_phone: Option<String>) -> Result<SendResultResponse, AppError> {
        let phone = test_phone.ok_or_else(|| bad_request_error("Test telefon numarası gerekli"))?;
        let success = self.notifier.send_whatsapp(&phone, TEST_WHATSAPP_MESSAGE).await;
        Ok(SendResultResponse::new(success, "Test mesajı başarıyla gönderildi", TEST_SEND_FAILED))
    }

    pub async fn test_turkish_template(&self, request: TestTemplateRequest) -> Result<SendResultResponse, AppError> {
        let fields = TemplateFields::sample_turkish();
        let success = match request.recipient_type.as_str() {
            "admin" => {
                let message = format_template(NotificationKind::Arrival, &fields);
                self.notifier.broadcast_admins(&message).await
            }
            "driver" => {
                let phone = request
                    .test_phone
                    .ok_or_else(|| bad_request_error("Şoför testi için telefon numarası gerekli"))?;
                let message = format_template(NotificationKind::DriverAssignment, &fields);
                self.notifier.send_whatsapp(&phone, &message).await
            }
            _ => return Err(bad_request_error("Geçersiz alıcı türü")),
        };

        Ok(SendResultResponse::new(
            success,
            "Türkçe şablon test mesajı başarıyla gönderildi",
            TEST_SEND_FAILED,
        ))
    }

    pub async fn backup(&self) -> Result<BackupResponse, AppError> {
        Ok(BackupResponse {
            backup_date: Utc::now(),
            settings: self.all_values().await?,
        })
    }

    pub async fn restore(&self, settings: &Map<String, Value>) -> Result<usize, AppError> {
        let entries: Vec<(String, String)> = settings
            .iter()
            .map(|(key, value)| (key.clone(), encode_setting_value(value)))
            .collect();
        self.repository.upsert_many(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_require_fields_reports_first_missing() {
        let err = require_fields(&body(json!({"access_token": "t", "phone_number_id": ""})), &[
            "access_token",
            "phone_number_id",
            "app_id",
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Field phone_number_id is required");
    }

    #[test]
    fn test_meta_settings_defaults_optional_fields() {
        let settings = meta_settings_from(&body(json!({
            "access_token": "t", "phone_number_id": 1234567, "app_id": "a", "app_secret": "s"
        })))
        .unwrap();
        assert_eq!(settings.phone_number_id, "1234567");
        assert_eq!(settings.api_version, "v18.0");
        assert_eq!(settings.webhook_verify_token, "");
    }

    #[test]
    fn test_email_settings_accept_string_or_number_port() {
        let base = json!({"smtp_server": "smtp.example.com", "username": "u@example.com", "password": "p"});

        let mut with_string = base.clone();
        with_string["smtp_port"] = json!("2525");
        assert_eq!(email_settings_from(&body(with_string)).unwrap().smtp_port, 2525);

        let mut with_number = base.clone();
        with_number["smtp_port"] = json!(465);
        assert_eq!(email_settings_from(&body(with_number)).unwrap().smtp_port, 465);

        let err = email_settings_from(&body(base)).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Field smtp_port is required");
    }

    #[test]
    fn test_admin_phones_trimmed_and_prefixed() {
        let phones = vec![" 905551112233 ".to_string(), "".to_string(), "+905554445566".to_string()];
        assert_eq!(normalize_admin_phones(&phones), vec!["+905551112233", "+905554445566"]);
    }
}
