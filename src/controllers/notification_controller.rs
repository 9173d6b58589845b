use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::notification_dto::{
    AdminSettingsRequest, AdminSettingsResponse, CompanyNotificationRequest, CompanyNotificationResponse,
    FormattedNotificationRequest, FormattedNotificationResponse, NotificationResponse, ScheduleResponse,
    SendNotificationRequest, SendResultResponse, TestNotificationRequest, UpcomingNotificationsResponse,
    UpcomingServiceEntry, WebhookVerifyQuery,
};
use crate::models::notification::encode_setting_value;
use crate::models::{BookingStatus, EmailSettings, MetaWhatsappSettings};
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::company_repository::CompanyRepository;
use crate::repositories::driver_repository::DriverRepository;
use crate::repositories::notification_repository::{NewNotification, NotificationRepository};
use crate::repositories::service_repository::ServiceRepository;
use crate::repositories::settings_repository::{self, SettingsRepository};
use crate::services::notification_service::{
    dispatch_reminders, plan_reminders, select_upcoming, SharedNotifier, UpcomingServices,
};
use crate::services::notification_templates::{company_digest, format_template, NotificationKind, TemplateFields};
use crate::services::whatsapp_service::verify_signature;
use crate::utils::errors::{bad_request_error, not_found_error, AppError};

const DRIVER_EMAIL_SUBJECT: &str = "Rezervasyon Hatırlatması - Servis Bildirimi";
const TEST_SEND_FAILED: &str = "Test mesajı gönderilemedi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Email,
    Whatsapp,
}

impl Method {
    fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.unwrap_or("email") {
            "email" => Ok(Method::Email),
            "whatsapp" => Ok(Method::Whatsapp),
            _ => Err(bad_request_error("Invalid notification method")),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Method::Email => "email",
            Method::Whatsapp => "whatsapp",
        }
    }
}

/// Destino de un mensaje con plantilla
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedTarget {
    Admins,
    Driver(String),
}

/// Campos obligatorios en orden; devuelve el primero que falta
pub fn validate_formatted(request: &FormattedNotificationRequest) -> Result<FormattedTarget, AppError> {
    let required = [
        ("client_name", &request.client_name),
        ("arrival_time", &request.arrival_time),
        ("date", &request.date),
        ("tour_name", &request.tour_name),
        ("recipient_type", &request.recipient_type),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.is_none()) {
        return Err(bad_request_error(format!("Field {} is required", field)));
    }

    match request.recipient_type.as_deref() {
        Some("admin") => Ok(FormattedTarget::Admins),
        Some("driver") => request
            .driver_phone
            .clone()
            .map(FormattedTarget::Driver)
            .ok_or_else(|| bad_request_error("Driver phone is required for driver notifications")),
        _ => Err(bad_request_error("Invalid recipient_type. Must be 'admin' or 'driver'")),
    }
}

/// Resultado del handshake GET del webhook
pub fn verify_webhook_token(
    settings: Option<&MetaWhatsappSettings>,
    query: &WebhookVerifyQuery,
) -> Result<String, AppError> {
    let expected = settings
        .map(|s| s.webhook_verify_token.as_str())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Forbidden("Webhook verify token not configured".to_string()))?;

    if query.verify_token.as_deref() != Some(expected) {
        return Err(AppError::Forbidden("Invalid verify token".to_string()));
    }
    Ok(query.challenge.clone().unwrap_or_default())
}

/// Registrar los mensajes y cambios de estado de un evento del webhook
pub fn log_webhook_events(payload: &serde_json::Value) -> usize {
    let mut events = 0;
    let entries = payload["entry"].as_array().map(Vec::as_slice).unwrap_or_default();
    for change in entries.iter().filter_map(|e| e["changes"].as_array()).flatten() {
        if change["field"] != "messages" {
            continue;
        }
        let value = &change["value"];
        for message in value["messages"].as_array().into_iter().flatten() {
            tracing::info!("💬 Mensaje recibido por WhatsApp: {}", message);
            events += 1;
        }
        for status in value["statuses"].as_array().into_iter().flatten() {
            tracing::info!("📬 Estado de mensaje: {}", status);
            events += 1;
        }
    }
    events
}

/// Día objetivo del resumen de empresa; horas fuera de rango son un 400
pub fn company_target_date(now: NaiveDateTime, hours_ahead: i64) -> Result<NaiveDate, AppError> {
    Duration::try_hours(hours_ahead)
        .and_then(|ahead| now.checked_add_signed(ahead))
        .map(|target| target.date())
        .ok_or_else(|| bad_request_error("hours_ahead is out of range"))
}

pub struct NotificationController {
    repository: NotificationRepository,
    drivers: DriverRepository,
    bookings: BookingRepository,
    companies: CompanyRepository,
    services: ServiceRepository,
    settings: SettingsRepository,
    notifier: SharedNotifier,
}

impl NotificationController {
    pub fn new(pool: PgPool, notifier: SharedNotifier) -> Self {
        Self {
            repository: NotificationRepository::new(pool.clone()),
            drivers: DriverRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            services: ServiceRepository::new(pool.clone()),
            settings: SettingsRepository::new(pool),
            notifier,
        }
    }

    pub async fn send(&self, request: SendNotificationRequest) -> Result<NotificationResponse, AppError> {
        let (Some(driver_id), Some(booking_id), Some(message)) =
            (request.driver_id, request.booking_id, request.message)
        else {
            return Err(bad_request_error("Driver ID, booking ID, and message are required"));
        };
        let method = Method::parse(request.method.as_deref())?;

        let driver = self
            .drivers
            .find_by_id(driver_id)
            .await?
            .ok_or_else(|| bad_request_error("Driver not found"))?;
        if !self.bookings.exists(booking_id).await? {
            return Err(bad_request_error("Booking not found"));
        }

        let is_sent = match method {
            Method::Email => {
                if driver.email.trim().is_empty() {
                    return Err(bad_request_error("Driver email not available"));
                }
                self.notifier
                    .send_email(&driver.email, DRIVER_EMAIL_SUBJECT, &message)
                    .await
            }
            Method::Whatsapp => {
                if driver.phone.trim().is_empty() {
                    return Err(bad_request_error("Driver phone not available"));
                }
                self.notifier.send_whatsapp(&driver.phone, &message).await
            }
        };

        let notification = self
            .repository
            .create(&NewNotification {
                driver_id: Some(driver_id),
                booking_id: Some(booking_id),
                message,
                method: method.as_str().to_string(),
                is_sent,
            })
            .await?;

        Ok(NotificationResponse::from(notification))
    }

    pub async fn send_formatted(
        &self,
        request: FormattedNotificationRequest,
    ) -> Result<FormattedNotificationResponse, AppError> {
        let target = validate_formatted(&request)?;
        let kind = NotificationKind::parse(request.notification_type.as_deref().unwrap_or("arrival"));
        let message = format_template(
            kind,
            &TemplateFields {
                client_name: request.client_name.as_deref().unwrap_or_default(),
                arrival_time: request.arrival_time.as_deref().unwrap_or_default(),
                date: request.date.as_deref().unwrap_or_default(),
                tour_name: request.tour_name.as_deref().unwrap_or_default(),
            },
        );

        let success = match &target {
            FormattedTarget::Admins => self.notifier.broadcast_admins(&message).await,
            FormattedTarget::Driver(phone) => self.notifier.send_whatsapp(phone, &message).await,
        };

        let notification = self
            .repository
            .create(&NewNotification {
                driver_id: request.driver_id,
                booking_id: request.booking_id,
                message: message.clone(),
                method: Method::Whatsapp.as_str().to_string(),
                is_sent: success,
            })
            .await?;

        Ok(FormattedNotificationResponse {
            success,
            message: if success {
                "Bildirim başarıyla gönderildi"
            } else {
                "Bildirim gönderimi başarısız"
            }
            .to_string(),
            notification_id: notification.id,
            formatted_message: message,
        })
    }

    async fn meta_settings(&self) -> Result<Option<MetaWhatsappSettings>, AppError> {
        self.settings.get_json(settings_repository::META_WHATSAPP).await
    }

    pub async fn verify_webhook(&self, query: WebhookVerifyQuery) -> Result<String, AppError> {
        let settings = self.meta_settings().await?;
        verify_webhook_token(settings.as_ref(), &query)
    }

    pub async fn receive_webhook(&self, signature: Option<&str>, body: &[u8]) -> Result<(), AppError> {
        if let Some(settings) = self.meta_settings().await? {
            if !settings.app_secret.is_empty() && !verify_signature(&settings.app_secret, body, signature) {
                return Err(AppError::Forbidden("Invalid signature".to_string()));
            }
        }

        let payload: serde_json::Value =
            serde_json::from_slice(body).map_err(|_| bad_request_error("Invalid webhook payload"))?;
        let events = log_webhook_events(&payload);
        tracing::info!("📨 Webhook de WhatsApp recibido ({} eventos)", events);
        Ok(())
    }

    pub async fn list_for_driver(&self, driver_id: Uuid) -> Result<Vec<NotificationResponse>, AppError> {
        let notifications = self.repository.list_for_driver(driver_id).await?;
        Ok(notifications.into_iter().map(NotificationResponse::from).collect())
    }

    pub async fn notify_company(
        &self,
        company_id: Uuid,
        request: CompanyNotificationRequest,
    ) -> Result<CompanyNotificationResponse, AppError> {
        let target_date = company_target_date(Local::now().naive_local(), request.hours_ahead)?;
        let company = self
            .companies
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| not_found_error("Company"))?;

        let services = self
            .services
            .details_for_company_starting_on(company_id, target_date, &BookingStatus::ACTIVE)
            .await?;

        if services.is_empty() {
            return Ok(CompanyNotificationResponse {
                message: "Bu şirket için belirtilen dönemde yaklaşan hizmet bulunamadı".to_string(),
                success: false,
                services_count: 0,
                total_revenue: Default::default(),
            });
        }

        let (message, total_revenue) = company_digest(&company.name, target_date, &services);
        let subject = format!("Yaklaşan Hizmetler - {}", target_date.format("%Y-%m-%d"));
        let success = match company.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => self.notifier.send_email(email, &subject, &message).await,
            None => {
                tracing::warn!("⚠️ Empresa {} sin email, resumen no enviado", company.name);
                false
            }
        };

        Ok(CompanyNotificationResponse {
            message: if success {
                "Şirket bildirimi başarıyla gönderildi"
            } else {
                "Şirket bildirimi gönderilemedi"
            }
            .to_string(),
            success,
            services_count: services.len(),
            total_revenue,
        })
    }

    async fn upcoming_at(&self, now: NaiveDateTime) -> Result<UpcomingServices, AppError> {
        let next_day = self
            .services
            .details_starting_on((now + Duration::hours(24)).date(), &BookingStatus::ACTIVE)
            .await?;
        let next_hour_day = self
            .services
            .details_starting_on((now + Duration::hours(1)).date(), &BookingStatus::ACTIVE)
            .await?;
        Ok(select_upcoming(now, next_day, next_hour_day))
    }

    pub async fn schedule(&self) -> Result<ScheduleResponse, AppError> {
        let upcoming = self.upcoming_at(Local::now().naive_local()).await?;
        let reminders = plan_reminders(&upcoming);
        let notifications_sent = dispatch_reminders(self.notifier.as_ref(), &reminders).await;

        Ok(ScheduleResponse {
            message: format!("{} bildirim başarıyla gönderildi", notifications_sent),
            notifications_sent,
        })
    }

    pub async fn upcoming(&self) -> Result<UpcomingNotificationsResponse, AppError> {
        let upcoming = self.upcoming_at(Local::now().naive_local()).await?;
        Ok(UpcomingNotificationsResponse {
            upcoming_24h: upcoming.within_24h.iter().map(UpcomingServiceEntry::from).collect(),
            upcoming_1h: upcoming.within_1h.iter().map(UpcomingServiceEntry::from).collect(),
        })
    }

    pub async fn send_test(&self, request: TestNotificationRequest) -> Result<SendResultResponse, AppError> {
        match request.test_type.as_str() {
            "admin" => {
                let message = format_template(NotificationKind::Arrival, &TemplateFields::sample_admin());
                let success = self.notifier.broadcast_admins(&message).await;
                Ok(SendResultResponse::new(success, "Yönetim için test mesajı gönderildi", TEST_SEND_FAILED))
            }
            "driver" => {
                let phone = request
                    .phone_number
                    .ok_or_else(|| bad_request_error("Şoför testi için telefon numarası gerekli"))?;
                let message = format_template(NotificationKind::DriverAssignment, &TemplateFields::sample_driver());
                let success = self.notifier.send_whatsapp(&phone, &message).await;
                Ok(SendResultResponse::new(success, "Şoför için test mesajı gönderildi", TEST_SEND_FAILED))
            }
            _ => Err(bad_request_error("Geçersiz test türü. 'admin' veya 'driver' kullanın")),
        }
    }

    pub async fn admin_settings(&self) -> Result<AdminSettingsResponse, AppError> {
        let admin_phone_numbers = self
            .settings
            .get_json::<Vec<String>>(settings_repository::ADMIN_PHONES)
            .await?
            .unwrap_or_default();
        let meta = self.meta_settings().await?;
        let email = self
            .settings
            .get_json::<EmailSettings>(settings_repository::EMAIL_SETTINGS)
            .await?;

        // El token y el secreto de la app no salen del servidor
        let meta_whatsapp_settings = match &meta {
            Some(settings) => serde_json::json!({
                "phone_number_id": settings.phone_number_id,
                "app_id": settings.app_id,
            }),
            None => serde_json::json!({}),
        };

        Ok(AdminSettingsResponse {
            admin_phone_numbers,
            meta_whatsapp_configured: meta.as_ref().map_or(false, MetaWhatsappSettings::is_configured),
            email_configured: email.as_ref().map_or(false, EmailSettings::is_configured),
            meta_whatsapp_settings,
        })
    }

    pub async fn update_admin_settings(&self, request: AdminSettingsRequest) -> Result<(), AppError> {
        let mut entries = Vec::new();
        if let Some(phones) = request.admin_phone_numbers {
            let phones: Vec<String> = phones
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            entries.push((
                settings_repository::ADMIN_PHONES.to_string(),
                encode_setting_value(&serde_json::json!(phones)),
            ));
        }
        if let Some(meta) = request.meta_whatsapp_settings {
            let value = serde_json::to_value(&meta).map_err(|e| bad_request_error(e.to_string()))?;
            entries.push((settings_repository::META_WHATSAPP.to_string(), encode_setting_value(&value)));
        }

        self.settings.upsert_many(&entries).await?;
        tracing::info!("🔧 Ajustes de notificación actualizados ({} claves)", entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn formatted(value: serde_json::Value) -> FormattedNotificationRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_company_target_date_rejects_out_of_range_hours() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap().and_hms_opt(20, 0, 0).unwrap();
        assert_eq!(
            company_target_date(now, 24).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 11).unwrap()
        );
        assert_eq!(company_target_date(now, 3).unwrap(), NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());

        let request: CompanyNotificationRequest =
            serde_json::from_value(json!({ "hours_ahead": 9_000_000_000_000_000i64 })).unwrap();
        let err = company_target_date(now, request.hours_ahead).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: hours_ahead is out of range");
        assert!(company_target_date(now, i64::MIN).is_err());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(Method::parse(None).unwrap(), Method::Email);
        assert_eq!(Method::parse(Some("whatsapp")).unwrap(), Method::Whatsapp);
        assert!(Method::parse(Some("sms")).is_err());
    }

    #[test]
    fn test_formatted_validation_order() {
        let err = validate_formatted(&formatted(json!({"client_name": "Ali"}))).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Field arrival_time is required");

        let base = json!({
            "client_name": "Ali", "arrival_time": "10:00", "date": "2024-05-10",
            "tour_name": "Boğaz Turu", "recipient_type": "driver"
        });
        let err = validate_formatted(&formatted(base.clone())).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Driver phone is required for driver notifications");

        let mut with_phone = base.clone();
        with_phone["driver_phone"] = json!("+905551112233");
        assert_eq!(
            validate_formatted(&formatted(with_phone)).unwrap(),
            FormattedTarget::Driver("+905551112233".to_string())
        );

        let mut other = base;
        other["recipient_type"] = json!("guest");
        assert!(validate_formatted(&formatted(other)).is_err());
    }

    #[test]
    fn test_webhook_token_check() {
        let query: WebhookVerifyQuery = serde_json::from_value(json!({
            "hub.verify_token": "abc", "hub.challenge": "42"
        }))
        .unwrap();

        let err = verify_webhook_token(None, &query).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);

        let settings = MetaWhatsappSettings {
            webhook_verify_token: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(verify_webhook_token(Some(&settings), &query).unwrap(), "42");

        let wrong = MetaWhatsappSettings {
            webhook_verify_token: "other".to_string(),
            ..Default::default()
        };
        assert!(verify_webhook_token(Some(&wrong), &query).is_err());
    }

    #[test]
    fn test_log_webhook_events_counts_messages_and_statuses() {
        let payload = json!({
            "entry": [{
                "changes": [
                    {"field": "messages", "value": {
                        "messages": [{"id": "m1"}],
                        "statuses": [{"id": "s1"}, {"id": "s2"}]
                    }},
                    {"field": "account_update", "value": {"messages": [{"id": "ignored"}]}}
                ]
            }]
        });
        assert_eq!(log_webhook_events(&payload), 3);
        assert_eq!(log_webhook_events(&json!({})), 0);
    }
}
