use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MetaWhatsappSettings, Notification, ServiceDetail};
use crate::utils::validation::{blank_as_none, blank_as_none_uuid};

// Request de envío directo a un conductor
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[serde(default, deserialize_with = "blank_as_none_uuid")]
    pub driver_id: Option<Uuid>,
    #[serde(default, deserialize_with = "blank_as_none_uuid")]
    pub booking_id: Option<Uuid>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub method: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub driver_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub message: String,
    pub method: String,
    pub sent_status: bool,
    pub send_time: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            driver_id: notification.driver_id,
            booking_id: notification.booking_id,
            message: notification.message,
            method: notification.notification_type,
            sent_status: notification.is_sent,
            send_time: notification.sent_at,
        }
    }
}

// Request de mensaje con plantilla (claves snake_case)
#[derive(Debug, Default, Deserialize)]
pub struct FormattedNotificationRequest {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub arrival_time: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub tour_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub recipient_type: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notification_type: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub driver_phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none_uuid")]
    pub driver_id: Option<Uuid>,
    #[serde(default, deserialize_with = "blank_as_none_uuid")]
    pub booking_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct FormattedNotificationResponse {
    pub success: bool,
    pub message: String,
    pub notification_id: Uuid,
    pub formatted_message: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookVerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompanyNotificationRequest {
    #[serde(default = "default_hours_ahead")]
    pub hours_ahead: i64,
}

impl Default for CompanyNotificationRequest {
    fn default() -> Self {
        Self {
            hours_ahead: default_hours_ahead(),
        }
    }
}

fn default_hours_ahead() -> i64 {
    24
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyNotificationResponse {
    pub message: String,
    pub success: bool,
    pub services_count: usize,
    pub total_revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub message: String,
    pub notifications_sent: usize,
}

// Servicio candidato a recordatorio
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingServiceEntry {
    pub service_id: Uuid,
    pub booking_id: Uuid,
    pub service_name: String,
    pub service_type: String,
    pub client_name: String,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
}

impl From<&ServiceDetail> for UpcomingServiceEntry {
    fn from(detail: &ServiceDetail) -> Self {
        Self {
            service_id: detail.service.id,
            booking_id: detail.service.booking_id,
            service_name: detail.service.service_name.clone(),
            service_type: detail.service.service_type.clone(),
            client_name: detail.client_name(),
            start_date: detail.service.start_date,
            start_time: detail.service.start_time,
            driver_name: detail.driver_name(),
            driver_phone: detail.driver_phone.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpcomingNotificationsResponse {
    pub upcoming_24h: Vec<UpcomingServiceEntry>,
    pub upcoming_1h: Vec<UpcomingServiceEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TestNotificationRequest {
    #[serde(default = "default_test_type", rename = "type")]
    pub test_type: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub phone_number: Option<String>,
}

fn default_test_type() -> String {
    "admin".to_string()
}

#[derive(Debug, Serialize)]
pub struct SendResultResponse {
    pub success: bool,
    pub message: String,
}

impl SendResultResponse {
    pub fn new(success: bool, ok_message: &str, failed_message: &str) -> Self {
        Self {
            success,
            message: if success { ok_message } else { failed_message }.to_string(),
        }
    }
}

// Ajustes de avisos sin secretos
#[derive(Debug, Serialize)]
pub struct AdminSettingsResponse {
    pub admin_phone_numbers: Vec<String>,
    pub meta_whatsapp_configured: bool,
    pub email_configured: bool,
    pub meta_whatsapp_settings: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct AdminSettingsRequest {
    pub admin_phone_numbers: Option<Vec<String>>,
    pub meta_whatsapp_settings: Option<MetaWhatsappSettings>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webhook_query_uses_hub_keys() {
        let query: WebhookVerifyQuery = serde_json::from_value(json!({
            "hub.mode": "subscribe",
            "hub.verify_token": "token",
            "hub.challenge": "12345"
        }))
        .unwrap();
        assert_eq!(query.verify_token.as_deref(), Some("token"));
        assert_eq!(query.challenge.as_deref(), Some("12345"));
    }

    #[test]
    fn test_request_defaults() {
        let request: CompanyNotificationRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.hours_ahead, 24);

        let request: TestNotificationRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.test_type, "admin");
        assert!(request.phone_number.is_none());
    }
}
