//! Servicio de notificaciones
//!
//! `Notifier` es la frontera con los canales de salida (WhatsApp y correo).
//! Los envíos devuelven `bool`: los fallos se registran y nunca se propagan.
//! La selección de recordatorios es pura y se prueba sin red.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use futures::future::join_all;
use sqlx::PgPool;

use crate::models::{EmailSettings, MetaWhatsappSettings, ServiceDetail};
use crate::repositories::settings_repository::{self, SettingsRepository};
use crate::services::email_service;
use crate::services::notification_templates::{service_reminder, NotificationKind};
use crate::services::whatsapp_service::WhatsappClient;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_whatsapp(&self, phone: &str, message: &str) -> bool;

    async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> bool;

    async fn admin_phones(&self) -> Vec<String>;

    /// Éxito si al menos un administrador recibe el mensaje
    async fn broadcast_admins(&self, message: &str) -> bool {
        let phones = self.admin_phones().await;
        if phones.is_empty() {
            log::warn!("⚠️ No hay teléfonos de administrador configurados");
            return false;
        }

        let results = join_all(phones.iter().map(|phone| self.send_whatsapp(phone, message))).await;
        let delivered = results.iter().filter(|ok| **ok).count();
        log::info!("📣 Aviso a administradores: {}/{} entregados", delivered, phones.len());
        delivered > 0
    }
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Notificador real: lee las credenciales de la tabla settings en cada envío
pub struct LiveNotifier {
    pool: PgPool,
    http: reqwest::Client,
    api_base: String,
}

impl LiveNotifier {
    pub fn new(pool: PgPool, http: reqwest::Client, api_base: String) -> Self {
        Self { pool, http, api_base }
    }

    fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }
}

#[async_trait]
impl Notifier for LiveNotifier {
    async fn send_whatsapp(&self, phone: &str, message: &str) -> bool {
        let settings = match self.settings().get_json::<MetaWhatsappSettings>(settings_repository::META_WHATSAPP).await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                log::warn!("⚠️ Ajustes de Meta WhatsApp no configurados");
                return false;
            }
            Err(e) => {
                log::error!("❌ No se pudieron leer los ajustes de WhatsApp: {}", e);
                return false;
            }
        };

        let client = WhatsappClient::new(&self.http, &self.api_base, &settings);
        match client.send_text(phone, message).await {
            Ok(sent) => sent,
            Err(e) => {
                log::error!("❌ Envío de WhatsApp falló: {}", e);
                false
            }
        }
    }

    async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> bool {
        let settings = match self.settings().get_json::<EmailSettings>(settings_repository::EMAIL_SETTINGS).await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                log::warn!("⚠️ Ajustes de correo no configurados");
                return false;
            }
            Err(e) => {
                log::error!("❌ No se pudieron leer los ajustes de correo: {}", e);
                return false;
            }
        };

        match email_service::send_email(&settings, recipient, subject, body).await {
            Ok(sent) => sent,
            Err(e) => {
                log::error!("❌ Envío de correo falló: {}", e);
                false
            }
        }
    }

    async fn admin_phones(&self) -> Vec<String> {
        match self.settings().get_json::<Vec<String>>(settings_repository::ADMIN_PHONES).await {
            Ok(phones) => phones.unwrap_or_default(),
            Err(e) => {
                log::error!("❌ No se pudieron leer los teléfonos de administrador: {}", e);
                Vec::new()
            }
        }
    }
}

/// Destinatario de un recordatorio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Admins,
    Driver(String),
}

#[derive(Debug, Clone)]
pub struct Reminder {
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub message: String,
}

/// Servicios candidatos a recordatorio
#[derive(Debug, Default)]
pub struct UpcomingServices {
    pub within_24h: Vec<ServiceDetail>,
    pub within_1h: Vec<ServiceDetail>,
}

const ONE_HOUR_WINDOW_MIN: i64 = 50;
const ONE_HOUR_WINDOW_MAX: i64 = 70;

/// Inicio entre 50 y 70 minutos después de `now`; sin hora no hay aviso de 1h
pub fn starts_in_about_an_hour(detail: &ServiceDetail, now: NaiveDateTime) -> bool {
    let Some(time) = detail.service.start_time else {
        return false;
    };
    let until = detail.service.start_date.and_time(time) - now;
    until >= Duration::minutes(ONE_HOUR_WINDOW_MIN) && until <= Duration::minutes(ONE_HOUR_WINDOW_MAX)
}

fn driver_phone(detail: &ServiceDetail) -> Option<String> {
    detail.service.driver_id?;
    detail
        .driver_phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Separar los servicios de las fechas objetivo en ventanas de 24h y 1h
///
/// `next_day` son los servicios que empiezan mañana, `next_hour_day` los del día
/// de `now + 1h`.
pub fn select_upcoming(
    now: NaiveDateTime,
    next_day: Vec<ServiceDetail>,
    next_hour_day: Vec<ServiceDetail>,
) -> UpcomingServices {
    let within_1h = next_hour_day
        .into_iter()
        .filter(|detail| starts_in_about_an_hour(detail, now))
        .collect();

    UpcomingServices {
        within_24h: next_day,
        within_1h,
    }
}

/// Recordatorios a enviar: administradores y conductores, 24h y 1h
pub fn plan_reminders(upcoming: &UpcomingServices) -> Vec<Reminder> {
    let mut reminders = Vec::new();

    for detail in &upcoming.within_24h {
        reminders.push(Reminder {
            recipient: Recipient::Admins,
            kind: NotificationKind::Reminder24h,
            message: service_reminder(NotificationKind::Reminder24h, detail),
        });
    }

    // Los administradores sólo reciben el aviso de 1h para tours
    for detail in upcoming.within_1h.iter().filter(|d| d.service.is_tour()) {
        reminders.push(Reminder {
            recipient: Recipient::Admins,
            kind: NotificationKind::Reminder1h,
            message: service_reminder(NotificationKind::Reminder1h, detail),
        });
    }

    for (detail, kind) in upcoming
        .within_24h
        .iter()
        .map(|d| (d, NotificationKind::Reminder24h))
        .chain(upcoming.within_1h.iter().map(|d| (d, NotificationKind::Reminder1h)))
    {
        if let Some(phone) = driver_phone(detail) {
            reminders.push(Reminder {
                recipient: Recipient::Driver(phone),
                kind,
                message: service_reminder(kind, detail),
            });
        }
    }

    reminders
}

/// Enviar los recordatorios y devolver cuántos se entregaron
pub async fn dispatch_reminders(notifier: &dyn Notifier, reminders: &[Reminder]) -> usize {
    let mut sent = 0;
    for reminder in reminders {
        let delivered = match &reminder.recipient {
            Recipient::Admins => notifier.broadcast_admins(&reminder.message).await,
            Recipient::Driver(phone) => notifier.send_whatsapp(phone, &reminder.message).await,
        };
        if delivered {
            sent += 1;
        }
    }

    log::info!("⏰ {} de {} recordatorios enviados", sent, reminders.len());
    sent
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Notificador en memoria que registra los envíos
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub admins: Vec<String>,
        pub failing_phones: Vec<String>,
        pub whatsapp: Mutex<Vec<(String, String)>>,
        pub emails: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_whatsapp(&self, phone: &str, message: &str) -> bool {
            if self.failing_phones.iter().any(|p| p == phone) {
                return false;
            }
            self.whatsapp
                .lock()
                .unwrap()
                .push((phone.to_string(), message.to_string()));
            true
        }

        async fn send_email(&self, recipient: &str, subject: &str, _body: &str) -> bool {
            self.emails
                .lock()
                .unwrap()
                .push((recipient.to_string(), subject.to_string()));
            true
        }

        async fn admin_phones(&self) -> Vec<String> {
            self.admins.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;
    use crate::models::service::fixtures::{detail, service};
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn at(service_type: &str, hour: u32, minute: u32) -> ServiceDetail {
        let mut s = service(service_type);
        s.start_time = NaiveTime::from_hms_opt(hour, minute, 0);
        detail(s, Uuid::new_v4(), "Ali Demir")
    }

    fn with_driver(mut detail: ServiceDetail, phone: &str) -> ServiceDetail {
        detail.service.driver_id = Some(Uuid::new_v4());
        detail.driver_phone = Some(phone.to_string());
        detail
    }

    #[test]
    fn test_one_hour_window_bounds() {
        assert!(starts_in_about_an_hour(&at("Tour", 9, 50), now()));
        assert!(starts_in_about_an_hour(&at("Tour", 10, 10), now()));
        assert!(!starts_in_about_an_hour(&at("Tour", 9, 49), now()));
        assert!(!starts_in_about_an_hour(&at("Tour", 10, 11), now()));
        assert!(!starts_in_about_an_hour(&detail(service("Tour"), Uuid::new_v4(), "A B"), now()));
    }

    #[test]
    fn test_plan_reminders_targets() {
        let tomorrow = vec![
            with_driver(detail(service("Hotel"), Uuid::new_v4(), "Ali Demir"), "+905551112233"),
            detail(service("Tour"), Uuid::new_v4(), "Ayşe Kaya"),
        ];
        let today = vec![
            at("Tour", 10, 0),
            with_driver(at("Vehicle", 10, 0), "+905554445566"),
            at("Tour", 15, 0),
        ];

        let upcoming = select_upcoming(now(), tomorrow, today);
        assert_eq!(upcoming.within_24h.len(), 2);
        assert_eq!(upcoming.within_1h.len(), 2);

        let reminders = plan_reminders(&upcoming);
        let admin_24h = reminders
            .iter()
            .filter(|r| r.recipient == Recipient::Admins && r.kind == NotificationKind::Reminder24h)
            .count();
        let admin_1h = reminders
            .iter()
            .filter(|r| r.recipient == Recipient::Admins && r.kind == NotificationKind::Reminder1h)
            .count();
        let drivers: Vec<_> = reminders
            .iter()
            .filter_map(|r| match &r.recipient {
                Recipient::Driver(phone) => Some((phone.as_str(), r.kind)),
                Recipient::Admins => None,
            })
            .collect();

        assert_eq!(admin_24h, 2);
        assert_eq!(admin_1h, 1);
        assert_eq!(
            drivers,
            vec![
                ("+905551112233", NotificationKind::Reminder24h),
                ("+905554445566", NotificationKind::Reminder1h),
            ]
        );
    }

    #[tokio::test]
    async fn test_broadcast_succeeds_with_one_delivery() {
        let notifier = RecordingNotifier {
            admins: vec!["+901".to_string(), "+902".to_string()],
            failing_phones: vec!["+901".to_string()],
            ..Default::default()
        };
        assert!(notifier.broadcast_admins("hello").await);
        assert_eq!(notifier.whatsapp.lock().unwrap().len(), 1);

        let nobody = RecordingNotifier::default();
        assert!(!nobody.broadcast_admins("hello").await);
    }

    #[tokio::test]
    async fn test_dispatch_counts_delivered() {
        let notifier = RecordingNotifier {
            failing_phones: vec!["+902".to_string()],
            ..Default::default()
        };
        let reminders = vec![
            Reminder {
                recipient: Recipient::Admins,
                kind: NotificationKind::Reminder24h,
                message: "a".to_string(),
            },
            Reminder {
                recipient: Recipient::Driver("+901".to_string()),
                kind: NotificationKind::Reminder1h,
                message: "b".to_string(),
            },
            Reminder {
                recipient: Recipient::Driver("+902".to_string()),
                kind: NotificationKind::Reminder1h,
                message: "c".to_string(),
            },
        ];

        // Sin administradores configurados sólo cuenta el conductor que recibe
        assert_eq!(dispatch_reminders(&notifier, &reminders).await, 1);
    }
}
