//! Middleware del sistema
//!
//! CORS y limitación de velocidad por IP.

pub mod cors;
pub mod rate_limit;

pub use cors::cors_layer;
pub use rate_limit::{rate_limit_middleware, RateLimitState};
