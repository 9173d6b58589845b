use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{EmailSettings, MetaWhatsappSettings};
use crate::utils::validation::blank_as_none;

// Los ajustes usan claves snake_case, igual que el panel de configuración

#[derive(Debug, Deserialize)]
pub struct SettingValueRequest {
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct MetaWhatsappSettingsView {
    pub phone_number_id: String,
    pub app_id: String,
    pub webhook_verify_token: String,
    pub configured: bool,
}

impl From<Option<MetaWhatsappSettings>> for MetaWhatsappSettingsView {
    fn from(settings: Option<MetaWhatsappSettings>) -> Self {
        let settings = settings.unwrap_or_default();
        Self {
            configured: settings.is_configured(),
            phone_number_id: settings.phone_number_id,
            app_id: settings.app_id,
            webhook_verify_token: settings.webhook_verify_token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminPhonesRequest {
    #[serde(default)]
    pub phone_numbers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminPhonesResponse {
    pub admin_phone_numbers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EmailSettingsView {
    pub smtp_server: String,
    pub smtp_port: String,
    pub username: String,
    pub configured: bool,
}

impl From<Option<EmailSettings>> for EmailSettingsView {
    fn from(settings: Option<EmailSettings>) -> Self {
        match settings {
            Some(settings) => Self {
                configured: settings.is_configured(),
                smtp_server: settings.smtp_server,
                smtp_port: settings.smtp_port.to_string(),
                username: settings.username,
            },
            None => Self {
                smtp_server: String::new(),
                smtp_port: "587".to_string(),
                username: String::new(),
                configured: false,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TestWhatsappRequest {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub test_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestTemplateRequest {
    #[serde(default = "default_recipient_type")]
    pub recipient_type: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub test_phone: Option<String>,
}

fn default_recipient_type() -> String {
    "admin".to_string()
}

#[derive(Debug, Serialize)]
pub struct BackupResponse {
    pub backup_date: DateTime<Utc>,
    pub settings: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    #[serde(default)]
    pub settings: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_hide_secrets() {
        let meta = MetaWhatsappSettings {
            access_token: "secret-token".to_string(),
            phone_number_id: "123".to_string(),
            app_secret: "app-secret".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(MetaWhatsappSettingsView::from(Some(meta))).unwrap();
        assert_eq!(body["configured"], true);
        assert!(body.get("access_token").is_none());
        assert!(body.get("app_secret").is_none());

        let body = serde_json::to_value(EmailSettingsView::from(None)).unwrap();
        assert_eq!(body["smtp_port"], "587");
        assert_eq!(body["configured"], false);
        assert!(body.get("password").is_none());
    }
}
