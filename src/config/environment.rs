//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Errores al leer la configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} must be a valid number")]
    InvalidNumber(&'static str),
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,
    pub redis_url: Option<String>,
    pub cache_ttl_seconds: u64,
    pub invoices_dir: PathBuf,
    pub whatsapp_api_base: String,
    pub default_company_name: String,
}

impl EnvironmentConfig {
    /// Leer la configuración desde el entorno (tras `dotenvy::dotenv()`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: parse_or("PORT", 5000)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            database_url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_requests: parse_or("RATE_LIMIT_REQUESTS", 300)?,
            rate_limit_window: parse_or("RATE_LIMIT_WINDOW", 60)?,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            cache_ttl_seconds: parse_or("CACHE_TTL_SECONDS", 60)?,
            invoices_dir: env::var("INVOICES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./invoices")),
            whatsapp_api_base: env::var("WHATSAPP_API_BASE")
                .unwrap_or_else(|_| "https://graph.facebook.com".to_string()),
            default_company_name: env::var("DEFAULT_COMPANY_NAME")
                .unwrap_or_else(|_| "AK SERAGOLU TURIZM".to_string()),
        })
    }

    /// Configuración mínima para tests y herramientas
    pub fn for_database(database_url: &str) -> Self {
        Self {
            environment: "development".to_string(),
            port: 5000,
            host: "127.0.0.1".to_string(),
            database_url: database_url.to_string(),
            cors_origins: Vec::new(),
            rate_limit_requests: 300,
            rate_limit_window: 60,
            redis_url: None,
            cache_ttl_seconds: 60,
            invoices_dir: env::temp_dir().join("tourism_invoices"),
            whatsapp_api_base: "https://graph.facebook.com".to_string(),
            default_company_name: "AK SERAGOLU TURIZM".to_string(),
        }
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber(key)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_database_defaults() {
        let config = EnvironmentConfig::for_database("postgres://localhost/tourism");
        assert!(config.is_development());
        assert_eq!(config.server_url(), "127.0.0.1:5000");
        assert!(config.redis_url.is_none());
        assert_eq!(config.default_company_name, "AK SERAGOLU TURIZM");
    }

    #[test]
    fn test_parse_or_uses_default_when_missing() {
        let value: u32 = parse_or("TOURISM_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
