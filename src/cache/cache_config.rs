//! Configuración de cache
//!
//! Este módulo contiene la configuración para el sistema de cache.

use crate::config::EnvironmentConfig;

/// Configuración del cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub redis_url: String,
    pub default_ttl: u64,
}

impl CacheConfig {
    /// Sólo hay cache si `REDIS_URL` está definido
    pub fn from_environment(config: &EnvironmentConfig) -> Option<Self> {
        config.redis_url.as_ref().map(|url| Self {
            redis_url: url.clone(),
            default_ttl: config.cache_ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_disabled_without_redis_url() {
        let mut config = EnvironmentConfig::for_database("postgres://localhost/test");
        config.redis_url = None;
        assert!(CacheConfig::from_environment(&config).is_none());

        config.redis_url = Some("redis://cache:6379".to_string());
        config.cache_ttl_seconds = 30;
        let cache = CacheConfig::from_environment(&config).unwrap();
        assert_eq!(cache.redis_url, "redis://cache:6379");
        assert_eq!(cache.default_ttl, 30);
    }
}
