//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::utils::errors::{bad_request_error, AppResult};

lazy_static! {
    static ref SAFE_FILENAME: Regex = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
}

/// Deserializar strings vacíos o sólo espacios como `None`
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

/// UUID opcional que acepta `null`, `""` o un UUID en texto
pub fn blank_as_none_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_as_none(deserializer)? {
        Some(raw) => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid UUID: {}", raw))),
        None => Ok(None),
    }
}

/// Distinguir clave ausente (`None`) de clave presente con `null` (`Some(None)`)
pub fn present_uuid<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    blank_as_none_uuid(deserializer).map(Some)
}

/// Exigir un campo de texto presente y no vacío
pub fn require_text(value: &Option<String>, message: &str) -> AppResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(bad_request_error(message)),
    }
}

/// Validar y convertir string `YYYY-MM-DD` a fecha
pub fn parse_date(value: &str, message: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| bad_request_error(message))
}

/// Validar y convertir string `HH:MM` a hora
pub fn parse_time(value: &str, message: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| bad_request_error(message))
}

/// Verificar que un importe no sea negativo
pub fn non_negative(value: Decimal, message: &str) -> AppResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(bad_request_error(message));
    }
    Ok(value)
}

/// Nombre de archivo sin separadores de ruta ni caracteres especiales
pub fn is_safe_filename(name: &str) -> bool {
    !name.starts_with('.') && SAFE_FILENAME.is_match(name)
}

/// Convertir texto libre en un fragmento seguro para nombres de archivo
pub fn filename_fragment(value: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(value.trim(), "_");
    cleaned.trim_matches('_').to_string()
}

/// Normalizar un teléfono de administrador al formato `+<dígitos>`
pub fn normalize_admin_phone(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('+') {
        Some(trimmed.to_string())
    } else {
        Some(format!("+{}", trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "blank_as_none")]
        email: Option<String>,
    }

    #[test]
    fn test_blank_strings_become_none() {
        let payload: Payload = serde_json::from_str(r#"{"email": "   "}"#).unwrap();
        assert!(payload.email.is_none());

        let payload: Payload = serde_json::from_str(r#"{"email": " a@b.com "}"#).unwrap();
        assert_eq!(payload.email.as_deref(), Some("a@b.com"));

        let payload: Payload = serde_json::from_str(r#"{}"#).unwrap();
        assert!(payload.email.is_none());
    }

    #[derive(Deserialize)]
    struct DriverPatch {
        #[serde(default, deserialize_with = "present_uuid")]
        driver_id: Option<Option<Uuid>>,
    }

    #[test]
    fn test_present_uuid_tells_missing_from_null() {
        let patch: DriverPatch = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(patch.driver_id, None);

        let patch: DriverPatch = serde_json::from_str(r#"{"driver_id": null}"#).unwrap();
        assert_eq!(patch.driver_id, Some(None));

        let id = Uuid::new_v4();
        let patch: DriverPatch = serde_json::from_str(&format!(r#"{{"driver_id": "{}"}}"#, id)).unwrap();
        assert_eq!(patch.driver_id, Some(Some(id)));
    }

    #[test]
    fn test_parse_date_and_time() {
        assert_eq!(
            parse_date("2024-03-05", "bad").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert!(parse_date("05/03/2024", "bad").is_err());
        assert_eq!(
            parse_time("09:30", "bad").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(parse_time("9h30", "bad").is_err());
    }

    #[test]
    fn test_non_negative() {
        assert!(non_negative(dec!(0), "neg").is_ok());
        assert!(non_negative(dec!(12.5), "neg").is_ok());
        assert!(non_negative(dec!(-0.01), "neg").is_err());
    }

    #[test]
    fn test_safe_filename() {
        assert!(is_safe_filename("monthly_invoice_3_5_2024_partner_company.pdf"));
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename("invoices/other.pdf"));
        assert!(!is_safe_filename(".env"));
        assert_eq!(filename_fragment("Ali Veli & Co"), "Ali_Veli_Co");
    }

    #[test]
    fn test_normalize_admin_phone() {
        assert_eq!(normalize_admin_phone(" 905551112233 ").as_deref(), Some("+905551112233"));
        assert_eq!(normalize_admin_phone("+905551112233").as_deref(), Some("+905551112233"));
        assert_eq!(normalize_admin_phone("   "), None);
    }
}
