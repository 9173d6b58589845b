use anyhow::Result;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use super::CacheConfig;

const KEY_PREFIX: &str = "tourism_office";

/// Cliente Redis con connection pooling y operaciones async
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: CacheConfig,
}

impl RedisClient {
    /// Crear nuevo cliente Redis
    pub async fn new(config: CacheConfig) -> Result<Self> {
        info!("🔗 Conectando a Redis: {}", config.redis_url);

        let client = redis::Client::open(config.redis_url.clone())?;
        let manager = ConnectionManager::new(client).await?;

        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis conectado exitosamente");

        Ok(Self { manager, config })
    }

    pub fn default_ttl(&self) -> u64 {
        self.config.default_ttl
    }

    /// Generar clave de cache con prefijo
    pub fn make_key(name: &str) -> String {
        format!("{}:{}", KEY_PREFIX, name)
    }

    /// Leer un campo JSON de un hash
    pub async fn hash_get<T: DeserializeOwned>(&self, key: &str, field: &str) -> Result<Option<T>> {
        let mut conn = self.manager.clone();

        let value: Option<String> = redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut conn)
            .await?;

        match value {
            Some(raw) => {
                debug!("📥 Cache HIT para {}[{}]", key, field);
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => {
                debug!("❌ Cache MISS para {}[{}]", key, field);
                Ok(None)
            }
        }
    }

    /// Guardar un campo JSON en un hash y renovar el TTL del hash completo
    pub async fn hash_set<T: Serialize + Sync>(&self, key: &str, field: &str, value: &T, ttl: u64) -> Result<()> {
        let mut conn = self.manager.clone();
        let serialized = serde_json::to_string(value)?;

        let _: () = redis::pipe()
            .atomic()
            .cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(serialized)
            .ignore()
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!("💾 Cache SET para {}[{}] (TTL: {}s)", key, field, ttl);
        Ok(())
    }

    /// Borrar una clave completa
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        let count: i64 = conn.del(key).await?;
        debug!("🗑️ Cache DELETE para clave: {} (eliminados: {})", key, count);
        Ok(())
    }
}
