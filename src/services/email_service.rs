//! Envío de correo por SMTP con STARTTLS

use anyhow::{anyhow, Result};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::models::EmailSettings;

/// Correo de texto plano con el usuario SMTP como remitente
pub fn build_message(settings: &EmailSettings, recipient: &str, subject: &str, body: &str) -> Result<Message> {
    let from = settings
        .username
        .parse()
        .map_err(|e| anyhow!("Invalid sender address {}: {}", settings.username, e))?;
    let to = recipient
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid recipient address {}: {}", recipient, e))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| anyhow!("Failed to build email: {}", e))
}

/// Enviar un correo; `Ok(false)` si el SMTP no está configurado o rechaza el envío
pub async fn send_email(settings: &EmailSettings, recipient: &str, subject: &str, body: &str) -> Result<bool> {
    if !settings.is_configured() || settings.smtp_server.trim().is_empty() {
        log::warn!("⚠️ Ajustes de correo no configurados");
        return Ok(false);
    }

    let message = build_message(settings, recipient, subject, body)?;
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(settings.smtp_server.trim())?
        .port(settings.smtp_port)
        .credentials(Credentials::new(settings.username.clone(), settings.password.clone()))
        .build();

    match mailer.send(message).await {
        Ok(_) => {
            log::info!("📧 Correo enviado a {}", recipient);
            Ok(true)
        }
        Err(e) => {
            log::error!("❌ Envío de correo a {} falló: {}", recipient, e);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EmailSettings {
        EmailSettings {
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "office@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_build_message_uses_username_as_sender() {
        let message = build_message(&settings(), "driver@example.com", "Hatırlatma", "Merhaba").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("From: office@example.com"));
        assert!(raw.contains("To: driver@example.com"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        assert!(build_message(&settings(), "not an email", "Subject", "Body").is_err());
    }

    #[tokio::test]
    async fn test_send_email_skips_unconfigured() {
        let mut unconfigured = settings();
        unconfigured.password.clear();
        let sent = send_email(&unconfigured, "driver@example.com", "Subject", "Body").await.unwrap();
        assert!(!sent);
    }
}
