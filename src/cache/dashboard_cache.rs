//! Cache de los agregados del dashboard
//!
//! Todas las secciones viven en un mismo hash, así una escritura de reservas
//! invalida el dashboard entero con un solo DEL. Sin Redis todo es no-op.

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::redis_client::RedisClient;

#[derive(Clone, Default)]
pub struct DashboardCache {
    redis: Option<RedisClient>,
}

impl DashboardCache {
    pub fn new(redis: Option<RedisClient>) -> Self {
        Self { redis }
    }

    pub fn disabled() -> Self {
        Self { redis: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }

    fn key() -> String {
        RedisClient::make_key("dashboard")
    }

    pub async fn get<T: DeserializeOwned>(&self, section: &str) -> Option<T> {
        let redis = self.redis.as_ref()?;
        match redis.hash_get(&Self::key(), section).await {
            Ok(value) => value,
            Err(e) => {
                warn!("⚠️ Error leyendo dashboard cache [{}]: {}", section, e);
                None
            }
        }
    }

    pub async fn put<T: Serialize + Sync>(&self, section: &str, value: &T) {
        let Some(redis) = self.redis.as_ref() else {
            return;
        };
        if let Err(e) = redis.hash_set(&Self::key(), section, value, redis.default_ttl()).await {
            warn!("⚠️ Error guardando dashboard cache [{}]: {}", section, e);
        }
    }

    pub async fn invalidate(&self) {
        if let Some(redis) = self.redis.as_ref() {
            if let Err(e) = redis.delete(&Self::key()).await {
                warn!("⚠️ Error invalidando dashboard cache: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let cache = DashboardCache::disabled();
        assert!(!cache.is_enabled());
        cache.put("summary", &42u32).await;
        assert_eq!(cache.get::<u32>("summary").await, None);
        cache.invalidate().await;
    }
}
