//! Cliente de la API de WhatsApp Business (Meta Graph)
//!
//! Envío de mensajes de texto y verificación de la firma de los webhooks.

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::models::MetaWhatsappSettings;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_API_VERSION: &str = "v18.0";

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextBody<'a>,
}

pub struct WhatsappClient<'a> {
    http: &'a reqwest::Client,
    api_base: &'a str,
    settings: &'a MetaWhatsappSettings,
}

impl<'a> WhatsappClient<'a> {
    pub fn new(http: &'a reqwest::Client, api_base: &'a str, settings: &'a MetaWhatsappSettings) -> Self {
        Self {
            http,
            api_base,
            settings,
        }
    }

    fn messages_url(&self) -> String {
        let version = match self.settings.api_version.trim() {
            "" => DEFAULT_API_VERSION,
            v => v,
        };
        format!(
            "{}/{}/{}/messages",
            self.api_base.trim_end_matches('/'),
            version,
            self.settings.phone_number_id
        )
    }

    /// Enviar un texto; `Ok(false)` si Meta no responde 200
    pub async fn send_text(&self, phone: &str, message: &str) -> anyhow::Result<bool> {
        if !self.settings.is_configured() {
            log::warn!("⚠️ WhatsApp Business no está configurado");
            return Ok(false);
        }

        let to = recipient_number(phone);
        let payload = TextMessage {
            messaging_product: "whatsapp",
            to: &to,
            message_type: "text",
            text: TextBody { body: message },
        };

        let response = self
            .http
            .post(self.messages_url())
            .bearer_auth(&self.settings.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            log::info!("📱 WhatsApp enviado a {}", to);
            Ok(true)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ WhatsApp a {} falló con estado {}: {}", to, status, error_text);
            Ok(false)
        }
    }
}

/// Número en el formato que espera Meta: sin `+` ni espacios
pub fn recipient_number(phone: &str) -> String {
    phone
        .trim()
        .trim_start_matches('+')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Comprobar la cabecera `X-Hub-Signature-256` (`sha256=<hex>`) sobre el cuerpo crudo
pub fn verify_signature(app_secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(hex_digest) = header.and_then(|h| h.trim().strip_prefix("sha256=")) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
pub(crate) fn sign(app_secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_number_strips_plus_and_spaces() {
        assert_eq!(recipient_number("+90 555 123 45 67"), "905551234567");
        assert_eq!(recipient_number("905551234567"), "905551234567");
    }

    #[test]
    fn test_messages_url_defaults_version() {
        let http = reqwest::Client::new();
        let settings = MetaWhatsappSettings {
            access_token: "token".to_string(),
            phone_number_id: "12345".to_string(),
            ..Default::default()
        };
        let client = WhatsappClient::new(&http, "https://graph.facebook.com/", &settings);
        assert_eq!(client.messages_url(), "https://graph.facebook.com/v18.0/12345/messages");
    }

    #[test]
    fn test_verify_signature() {
        let body = br#"{"entry":[]}"#;
        let header = sign("secret", body);
        assert!(verify_signature("secret", body, Some(&header)));
        assert!(!verify_signature("other", body, Some(&header)));
        assert!(!verify_signature("secret", b"tampered", Some(&header)));
        assert!(!verify_signature("secret", body, Some("sha256=zz")));
        assert!(!verify_signature("secret", body, None));
    }
}
