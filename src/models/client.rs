//! Modelo de Client

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Client principal - mapea a la tabla clients
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub passport_number: Option<String>,
    pub license_number: Option<String>,
    pub address: Option<String>,
    pub company_id: Option<Uuid>,
    pub paid_amount: Decimal,
    pub payment_status: String,
    pub payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Cliente con el nombre de su empresa y su número de reservas
#[derive(Debug, Clone, FromRow)]
pub struct ClientSummary {
    #[sqlx(flatten)]
    pub client: Client,
    pub company_name: Option<String>,
    pub booking_count: i64,
}

/// Estados de pago admitidos
pub const PAYMENT_STATUSES: [&str; 3] = ["pending", "partial", "paid"];
