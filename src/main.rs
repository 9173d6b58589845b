use std::net::SocketAddr;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tourism_backoffice::build_app;
use tourism_backoffice::cache::{CacheConfig, RedisClient};
use tourism_backoffice::config::{DatabaseConfig, EnvironmentConfig};
use tourism_backoffice::database::DatabaseConnection;
use tourism_backoffice::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🧳 Tourism Back Office API");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::new(&DatabaseConfig::new(config.database_url.clone())).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    let pool = db_connection.pool().clone();

    // Redis es opcional: sin él el dashboard se calcula en cada request
    let redis = match CacheConfig::from_environment(&config) {
        Some(cache_config) => match RedisClient::new(cache_config).await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("⚠️ Redis no disponible, dashboard sin cache: {}", e);
                None
            }
        },
        None => {
            info!("ℹ️ REDIS_URL no definido, dashboard sin cache");
            None
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app = build_app(AppState::new(pool, config, redis));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Recursos bajo /api: clients, companies, drivers, vehicles, bookings, invoices, notifications, settings, dashboard");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
