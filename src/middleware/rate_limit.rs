//! Middleware de Rate Limiting
//!
//! Ventana fija por IP (`x-forwarded-for`), configurada con
//! `RATE_LIMIT_REQUESTS` y `RATE_LIMIT_WINDOW`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::EnvironmentConfig;
use crate::utils::errors::AppError;

#[derive(Debug, Clone)]
struct RateLimitInfo {
    requests: u32,
    window_start: Instant,
}

#[derive(Clone)]
pub struct RateLimitState {
    requests: Arc<RwLock<HashMap<String, RateLimitInfo>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimitState {
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self::with_limits(config.rate_limit_requests, Duration::from_secs(config.rate_limit_window))
    }

    pub fn with_limits(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window_duration,
        }
    }

    /// `false` cuando la IP ya agotó su ventana
    pub async fn check(&self, ip: &str) -> bool {
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        // Limpiar entradas expiradas
        requests.retain(|_, info| now.duration_since(info.window_start) < self.window_duration);

        let info = requests.entry(ip.to_string()).or_insert(RateLimitInfo {
            requests: 0,
            window_start: now,
        });

        if info.requests >= self.max_requests {
            return false;
        }

        info.requests += 1;
        true
    }
}

fn client_ip(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(rate_limit_state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request);

    if !rate_limit_state.check(&ip).await {
        warn!("🚫 Rate limit excedido para {}", ip);
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_window_blocks_after_limit() {
        let state = RateLimitState::with_limits(2, Duration::from_secs(60));
        assert!(state.check("10.0.0.1").await);
        assert!(state.check("10.0.0.1").await);
        assert!(!state.check("10.0.0.1").await);
        // Otra IP tiene su propia ventana
        assert!(state.check("10.0.0.2").await);
    }

    #[tokio::test]
    async fn test_expired_window_resets() {
        let state = RateLimitState::with_limits(1, Duration::from_millis(20));
        assert!(state.check("10.0.0.1").await);
        assert!(!state.check("10.0.0.1").await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(state.check("10.0.0.1").await);
    }

    #[test]
    fn test_client_ip_uses_first_forwarded_address() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), "203.0.113.7");

        let request = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(client_ip(&request), "unknown");
    }
}
