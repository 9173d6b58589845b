use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Client, ClientSummary};
use crate::utils::errors::AppError;

const SUMMARY_SELECT: &str = r#"
    SELECT c.*,
           co.name AS company_name,
           (SELECT COUNT(*) FROM bookings b WHERE b.client_id = c.id) AS booking_count
    FROM clients c
    LEFT JOIN companies co ON co.id = c.company_id
"#;

/// Campos editables de un cliente
#[derive(Debug, Clone)]
pub struct ClientFields {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub passport_number: Option<String>,
    pub license_number: Option<String>,
    pub address: Option<String>,
    pub company_id: Option<Uuid>,
}

pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<ClientSummary>, AppError> {
        let sql = format!("{} ORDER BY c.created_at DESC", SUMMARY_SELECT);
        let clients = sqlx::query_as::<_, ClientSummary>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    pub async fn find_summary(&self, id: Uuid) -> Result<Option<ClientSummary>, AppError> {
        let sql = format!("{} WHERE c.id = $1", SUMMARY_SELECT);
        let client = sqlx::query_as::<_, ClientSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn find_by_company(&self, company_id: Uuid) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE company_id = $1 ORDER BY last_name, first_name",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Verificar si el email ya lo usa otro cliente
    pub async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn create(&self, fields: ClientFields) -> Result<Client, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (id, first_name, last_name, email, phone, passport_number,
                                 license_number, address, company_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(fields.first_name)
        .bind(fields.last_name)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.passport_number)
        .bind(fields.license_number)
        .bind(fields.address)
        .bind(fields.company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn update(&self, id: Uuid, fields: ClientFields) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET first_name = $2, last_name = $3, email = $4, phone = $5, passport_number = $6,
                license_number = $7, address = $8, company_id = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.first_name)
        .bind(fields.last_name)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.passport_number)
        .bind(fields.license_number)
        .bind(fields.address)
        .bind(fields.company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn update_payment(
        &self,
        id: Uuid,
        paid_amount: Decimal,
        payment_status: &str,
        payment_date: Option<NaiveDate>,
    ) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET paid_amount = $2, payment_status = $3, payment_date = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(paid_amount)
        .bind(payment_status)
        .bind(payment_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn count_bookings(&self, id: Uuid) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE client_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
