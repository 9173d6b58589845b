use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Company, CompanyWithCount};
use crate::utils::errors::AppError;

const COUNT_SELECT: &str = r#"
    SELECT co.*,
           (SELECT COUNT(*) FROM clients c WHERE c.company_id = co.id) AS client_count
    FROM companies co
"#;

/// Campos editables de una empresa
#[derive(Debug, Clone)]
pub struct CompanyFields {
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub logo_path: Option<String>,
}

pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<CompanyWithCount>, AppError> {
        let sql = format!("{} ORDER BY co.name", COUNT_SELECT);
        let companies = sqlx::query_as::<_, CompanyWithCount>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(companies)
    }

    pub async fn find_with_count(&self, id: Uuid) -> Result<Option<CompanyWithCount>, AppError> {
        let sql = format!("{} WHERE co.id = $1", COUNT_SELECT);
        let company = sqlx::query_as::<_, CompanyWithCount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(company)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(company)
    }

    pub async fn name_exists(&self, name: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE name = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn create(&self, fields: CompanyFields) -> Result<Company, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (id, name, contact_person, email, phone, address, logo_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(fields.name)
        .bind(fields.contact_person)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.address)
        .bind(fields.logo_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn update(&self, id: Uuid, fields: CompanyFields) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET name = $2, contact_person = $3, email = $4, phone = $5, address = $6, logo_path = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.contact_person)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.address)
        .bind(fields.logo_path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn count_clients(&self, id: Uuid) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients WHERE company_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
