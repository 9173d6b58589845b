//! Modelos de notificaciones y configuración

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Notification - mapea a la tabla notifications
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub driver_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub message: String,
    pub notification_type: String,
    pub sent_at: DateTime<Utc>,
    pub is_sent: bool,
}

/// Setting clave/valor - mapea a la tabla settings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub id: Uuid,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    /// Valor como JSON; si no es JSON válido se devuelve como string
    pub fn json_value(&self) -> serde_json::Value {
        parse_setting_value(&self.value)
    }
}

pub fn parse_setting_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Los strings se guardan tal cual; el resto como JSON
pub fn encode_setting_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ajustes de la API de WhatsApp Business (`meta_whatsapp_settings`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaWhatsappSettings {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub phone_number_id: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub webhook_verify_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    "v18.0".to_string()
}

impl MetaWhatsappSettings {
    pub fn is_configured(&self) -> bool {
        !self.access_token.is_empty() && !self.phone_number_id.is_empty()
    }
}

/// Ajustes SMTP (`email_settings`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    #[serde(default)]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port", deserialize_with = "port_from_any")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// El puerto llega como número o como texto ("587")
fn port_from_any<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| serde::de::Error::custom("invalid SMTP port")),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom("invalid SMTP port")),
        serde_json::Value::Null => Ok(default_smtp_port()),
        _ => Err(serde::de::Error::custom("invalid SMTP port")),
    }
}

impl EmailSettings {
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_email_settings_accept_string_port() {
        let settings: EmailSettings = serde_json::from_value(json!({
            "smtp_server": "smtp.example.com",
            "smtp_port": "2525",
            "username": "office@example.com",
            "password": "secret"
        }))
        .unwrap();
        assert_eq!(settings.smtp_port, 2525);
        assert!(settings.is_configured());

        let settings: EmailSettings = serde_json::from_value(json!({"smtp_server": "x"})).unwrap();
        assert_eq!(settings.smtp_port, 587);
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_meta_settings_defaults() {
        let settings: MetaWhatsappSettings =
            serde_json::from_value(json!({"access_token": "t", "phone_number_id": "123"})).unwrap();
        assert_eq!(settings.api_version, "v18.0");
        assert!(settings.is_configured());
        assert!(!MetaWhatsappSettings::default().is_configured());
    }

    #[test]
    fn test_setting_value_encoding() {
        assert_eq!(encode_setting_value(&json!("AK TURIZM")), "AK TURIZM");
        assert_eq!(encode_setting_value(&json!(["+90555"])), r#"["+90555"]"#);
        assert_eq!(parse_setting_value(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_setting_value("plain text"), json!("plain text"));
    }
}
