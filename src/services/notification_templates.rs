//! Plantillas de mensajes en turco
//!
//! Mensajes de WhatsApp para administradores y conductores, y el resumen
//! diario de servicios que se envía por correo a las empresas asociadas.

use std::fmt::Write;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{ServiceDetail, ServiceType};

const SIGNATURE: &str = "---\nTur Yönetim Sistemi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Arrival,
    Reminder24h,
    Reminder1h,
    DriverAssignment,
    Generic,
}

impl NotificationKind {
    /// Tipos desconocidos usan la plantilla genérica
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "arrival" => NotificationKind::Arrival,
            "reminder_24h" => NotificationKind::Reminder24h,
            "reminder_1h" => NotificationKind::Reminder1h,
            "driver_assignment" => NotificationKind::DriverAssignment,
            _ => NotificationKind::Generic,
        }
    }
}

/// Datos que rellenan una plantilla
#[derive(Debug, Clone)]
pub struct TemplateFields<'a> {
    pub client_name: &'a str,
    pub arrival_time: &'a str,
    pub date: &'a str,
    pub tour_name: &'a str,
}

// Datos de ejemplo para los envíos de prueba
impl TemplateFields<'static> {
    pub fn sample_admin() -> Self {
        Self {
            client_name: "Ahmet Mehmet",
            arrival_time: "14:30",
            date: "2024-01-15",
            tour_name: "Tarihi Şehir Turu",
        }
    }

    pub fn sample_turkish() -> Self {
        Self {
            client_name: "Ahmet Yılmaz",
            arrival_time: "14:30",
            date: "2024-01-15",
            tour_name: "İstanbul Tarihi Şehir Turu",
        }
    }

    pub fn sample_driver() -> Self {
        Self {
            client_name: "Ayşe Fatma",
            arrival_time: "10:00",
            date: "2024-01-15",
            tour_name: "Sahil Turu",
        }
    }
}

pub fn format_template(kind: NotificationKind, fields: &TemplateFields<'_>) -> String {
    let TemplateFields {
        client_name,
        arrival_time,
        date,
        tour_name,
    } = fields;

    match kind {
        NotificationKind::Arrival => format!(
            "🔔 Yeni Müşteri Varış Bildirimi\n\n\
             👤 Müşteri Adı: {client_name}\n\
             🕐 Varış Saati: {arrival_time}\n\
             📅 Tarih: {date}\n\
             🎯 Tur Adı: {tour_name}\n\n\
             Lütfen müşteriyi belirlenen zamanda karşılamaya hazır olun.\n\n{SIGNATURE}"
        ),
        NotificationKind::Reminder24h => format!(
            "⏰ Hatırlatma: 24 Saat İçinde Müşteri Geliyor\n\n\
             👤 Müşteri Adı: {client_name}\n\
             🕐 Beklenen Varış Saati: {arrival_time}\n\
             📅 Tarih: {date}\n\
             🎯 Tur Adı: {tour_name}\n\n\
             Lütfen tüm hazırlıkların tamamlandığından emin olun.\n\n{SIGNATURE}"
        ),
        NotificationKind::Reminder1h => format!(
            "🚨 Acil Uyarı: Müşteri 1 Saat İçinde Geliyor\n\n\
             👤 Müşteri Adı: {client_name}\n\
             🕐 Varış Saati: {arrival_time}\n\
             📅 Tarih: {date}\n\
             🎯 Tur Adı: {tour_name}\n\n\
             Lütfen hemen karşılama noktasına gidin.\n\n{SIGNATURE}"
        ),
        NotificationKind::DriverAssignment => format!(
            "🚗 Yeni Tur Ataması\n\n\
             👤 Müşteri Adı: {client_name}\n\
             🕐 Başlangıç Saati: {arrival_time}\n\
             📅 Tarih: {date}\n\
             🎯 Tur Adı: {tour_name}\n\n\
             Lütfen tur detaylarını inceleyin ve belirlenen zamana hazır olun.\n\n{SIGNATURE}"
        ),
        NotificationKind::Generic => format!(
            "📋 Tur Yönetim Sistemi Bildirimi\n\n\
             👤 Müşteri: {client_name}\n\
             🕐 Saat: {arrival_time}\n\
             📅 Tarih: {date}\n\
             🎯 Tur: {tour_name}\n\n{SIGNATURE}"
        ),
    }
}

/// Mensaje de recordatorio para un servicio concreto
pub fn service_reminder(kind: NotificationKind, detail: &ServiceDetail) -> String {
    let client_name = detail.client_name();
    let arrival_time = detail.service.start_time_label();
    let date = detail.service.start_date.format("%Y-%m-%d").to_string();
    format_template(
        kind,
        &TemplateFields {
            client_name: &client_name,
            arrival_time: &arrival_time,
            date: &date,
            tour_name: &detail.service.service_name,
        },
    )
}

/// Resumen en turco de los servicios de una empresa para `date`, con el total vendido
pub fn company_digest(company_name: &str, date: NaiveDate, services: &[ServiceDetail]) -> (String, Decimal) {
    let mut hotels = String::new();
    let mut tours = String::new();
    let mut rentals = String::new();
    let mut total = Decimal::ZERO;

    for detail in services {
        let service = &detail.service;
        let price = service.total_selling_price();
        total += price;
        let client = detail.client_name();

        match service.kind() {
            Some(ServiceType::Hotel | ServiceType::Cabin) => {
                let _ = writeln!(
                    hotels,
                    "- {} müşteri {} için ({} gece) - ${:.2}",
                    service.hotel_name.as_deref().unwrap_or(&service.service_name),
                    client,
                    service.num_nights.unwrap_or(0),
                    price
                );
            }
            Some(ServiceType::Tour) => {
                let time_info = match (service.start_time, service.end_time) {
                    (Some(start), Some(end)) => {
                        format!(" ({} - {})", start.format("%H:%M"), end.format("%H:%M"))
                    }
                    (Some(start), None) => format!(" (başlangıç {})", start.format("%H:%M")),
                    _ => String::new(),
                };
                let _ = writeln!(
                    tours,
                    "- {} müşteri {} için{} - ${:.2}",
                    service.service_name, client, time_info, price
                );
            }
            Some(ServiceType::Vehicle) => {
                let driver_info = if service.with_driver.unwrap_or(false) {
                    " şoförlü"
                } else {
                    " şoförsüz"
                };
                let hours_info = match (service.is_hourly, service.hours) {
                    (true, Some(hours)) => format!(" ({} saat)", hours.normalize()),
                    _ => String::new(),
                };
                let _ = writeln!(
                    rentals,
                    "- {} müşteri {} için{}{} - ${:.2}",
                    service.service_name, client, driver_info, hours_info, price
                );
            }
            None => {}
        }
    }

    let mut message = format!("📋 {} Şirketi İçin Yaklaşan Hizmetler Bildirimi\n\n", company_name);
    let _ = writeln!(message, "{} tarihinde planlanan hizmetler:\n", date.format("%Y-%m-%d"));
    for (title, lines) in [("🏨 Oteller:", &hotels), ("🎯 Turlar:", &tours), ("🚗 Araç Kiralama:", &rentals)] {
        if !lines.is_empty() {
            let _ = writeln!(message, "{}\n{}", title, lines);
        }
    }
    let _ = write!(message, "💰 Toplam Gelir: ${:.2}", total.round_dp(2));

    (message, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::fixtures::{detail, service};
    use chrono::NaiveTime;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_templates_fill_fields() {
        let message = format_template(NotificationKind::Reminder1h, &TemplateFields::sample_driver());
        assert!(message.starts_with("🚨 Acil Uyarı"));
        assert!(message.contains("👤 Müşteri Adı: Ayşe Fatma"));
        assert!(message.contains("🕐 Varış Saati: 10:00"));
        assert!(message.ends_with("Tur Yönetim Sistemi"));

        let generic = format_template(NotificationKind::parse("something"), &TemplateFields::sample_turkish());
        assert!(generic.starts_with("📋 Tur Yönetim Sistemi Bildirimi"));
        assert!(generic.contains("🎯 Tur: İstanbul Tarihi Şehir Turu"));
    }

    #[test]
    fn test_service_reminder_without_time() {
        let message = service_reminder(
            NotificationKind::Reminder24h,
            &detail(service("Tour"), Uuid::new_v4(), "Ali Demir"),
        );
        assert!(message.contains("Müşteri Adı: Ali Demir"));
        assert!(message.contains("Beklenen Varış Saati: Belirtilmemiş"));
        assert!(message.contains("Tarih: 2024-05-10"));
    }

    #[test]
    fn test_company_digest_groups_by_type() {
        let client_id = Uuid::new_v4();
        let mut hotel = service("Hotel");
        hotel.hotel_name = Some("Pera Palace".to_string());
        hotel.num_nights = Some(2);
        hotel.selling_price_per_night = Some(dec!(100));
        let mut tour = service("Tour");
        tour.selling_price = Some(dec!(45.5));
        tour.start_time = NaiveTime::from_hms_opt(9, 0, 0);
        let mut car = service("Vehicle");
        car.selling_price = Some(dec!(30));
        car.is_hourly = true;
        car.hours = Some(dec!(3));
        car.with_driver = Some(true);

        let services: Vec<_> = [hotel, tour, car]
            .into_iter()
            .map(|s| detail(s, client_id, "Ali Demir"))
            .collect();
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let (message, total) = company_digest("Öz Turizm", date, &services);

        assert_eq!(total, dec!(335.5));
        assert!(message.starts_with("📋 Öz Turizm Şirketi İçin"));
        assert!(message.contains("2024-05-10 tarihinde planlanan hizmetler:"));
        assert!(message.contains("- Pera Palace müşteri Ali Demir için (2 gece) - $200.00"));
        assert!(message.contains("- Tour service müşteri Ali Demir için (başlangıç 09:00) - $45.50"));
        assert!(message.contains("şoförlü (3 saat) - $90.00"));
        assert!(message.ends_with("💰 Toplam Gelir: $335.50"));
    }
}
