//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use reqwest::Client;
use sqlx::PgPool;

use crate::cache::{DashboardCache, RedisClient};
use crate::config::environment::EnvironmentConfig;
use crate::services::notification_service::{LiveNotifier, SharedNotifier};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub dashboard_cache: DashboardCache,
    pub notifier: SharedNotifier,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, redis: Option<RedisClient>) -> Self {
        let notifier: SharedNotifier = Arc::new(LiveNotifier::new(
            pool.clone(),
            Client::new(),
            config.whatsapp_api_base.clone(),
        ));
        Self::with_notifier(pool, config, redis, notifier)
    }

    /// Estado con un notificador propio (tests, envíos simulados)
    pub fn with_notifier(
        pool: PgPool,
        config: EnvironmentConfig,
        redis: Option<RedisClient>,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            pool,
            config,
            dashboard_cache: DashboardCache::new(redis),
            notifier,
        }
    }
}
