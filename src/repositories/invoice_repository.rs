use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{
    Invoice, InvoiceWithBooking, MonthlyCompanyInvoice, MonthlyInvoiceItem, MonthlyInvoiceType,
    MonthlyInvoiceWithCompany, NewMonthlyInvoiceItem,
};
use crate::utils::errors::AppError;

pub const COMPLETED: &str = "completed";

/// Cabecera de una factura mensual antes de insertarla
#[derive(Debug, Clone)]
pub struct NewMonthlyInvoice {
    pub company_id: Uuid,
    pub month: u32,
    pub year: i32,
    pub invoice_date: NaiveDate,
    pub invoice_type: MonthlyInvoiceType,
    pub total_amount: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
}

pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Facturas de cliente con el nombre del cliente y los servicios de la reserva
    pub async fn list_client_invoices(&self) -> Result<Vec<InvoiceWithBooking>, AppError> {
        let invoices = sqlx::query_as::<_, InvoiceWithBooking>(
            r#"
            SELECT i.*,
                   c.first_name AS client_first_name,
                   c.last_name AS client_last_name,
                   (SELECT array_agg(s.service_name ORDER BY s.start_date, s.created_at)
                    FROM services s WHERE s.booking_id = i.booking_id) AS service_names
            FROM invoices i
            LEFT JOIN bookings b ON b.id = i.booking_id
            LEFT JOIN clients c ON c.id = b.client_id
            ORDER BY i.invoice_date DESC, i.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    pub async fn find_client_invoice(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    pub async fn create_client_invoice(
        &self,
        booking_id: Uuid,
        total_amount: Decimal,
        invoice_date: NaiveDate,
        pdf_path: &str,
    ) -> Result<Invoice, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (id, booking_id, invoice_type, total_amount, status, invoice_date, pdf_path)
            VALUES ($1, $2, 'client', $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(total_amount)
        .bind(COMPLETED)
        .bind(invoice_date)
        .bind(pdf_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(invoice)
    }

    pub async fn delete_client_invoice(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_monthly(&self) -> Result<Vec<MonthlyInvoiceWithCompany>, AppError> {
        let invoices = sqlx::query_as::<_, MonthlyInvoiceWithCompany>(
            r#"
            SELECT m.*, COALESCE(co.name, 'Unknown Company') AS company_name
            FROM monthly_company_invoices m
            LEFT JOIN companies co ON co.id = m.company_id
            ORDER BY m.invoice_year DESC, m.invoice_month DESC, m.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    pub async fn find_monthly(&self, id: Uuid) -> Result<Option<MonthlyCompanyInvoice>, AppError> {
        let invoice = sqlx::query_as::<_, MonthlyCompanyInvoice>(
            "SELECT * FROM monthly_company_invoices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    pub async fn items_of(&self, invoice_ids: &[Uuid]) -> Result<Vec<MonthlyInvoiceItem>, AppError> {
        let items = sqlx::query_as::<_, MonthlyInvoiceItem>(
            r#"
            SELECT * FROM monthly_invoice_items
            WHERE monthly_invoice_id = ANY($1)
            ORDER BY client_name, service_date
            "#,
        )
        .bind(invoice_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn monthly_exists(&self, company_id: Uuid, month: u32, year: i32) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM monthly_company_invoices
                WHERE company_id = $1 AND invoice_month = $2 AND invoice_year = $3
            )
            "#,
        )
        .bind(company_id)
        .bind(month as i32)
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Insertar la factura mensual y sus líneas en una transacción
    pub async fn create_monthly(
        &self,
        invoice: &NewMonthlyInvoice,
        items: &[NewMonthlyInvoiceItem],
    ) -> Result<MonthlyCompanyInvoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, MonthlyCompanyInvoice>(
            r#"
            INSERT INTO monthly_company_invoices
                (id, company_id, invoice_month, invoice_year, total_amount, total_cost, total_profit,
                 invoice_type, status, invoice_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(invoice.company_id)
        .bind(invoice.month as i32)
        .bind(invoice.year)
        .bind(invoice.total_amount)
        .bind(invoice.total_cost)
        .bind(invoice.total_profit)
        .bind(invoice.invoice_type.as_str())
        .bind(COMPLETED)
        .bind(invoice.invoice_date)
        .fetch_one(&mut *tx)
        .await?;

        insert_items(&mut *tx, created.id, items).await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn set_monthly_pdf(&self, id: Uuid, pdf_path: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE monthly_company_invoices SET pdf_path = $2 WHERE id = $1")
            .bind(id)
            .bind(pdf_path)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Las líneas se borran en cascada
    pub async fn delete_monthly(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM monthly_company_invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_items(
    conn: &mut PgConnection,
    invoice_id: Uuid,
    items: &[NewMonthlyInvoiceItem],
) -> Result<(), AppError> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO monthly_invoice_items
                (id, monthly_invoice_id, service_id, client_name, arrival_date, service_type,
                 service_name, service_date, cost_price, selling_price, profit, nights_or_hours,
                 city, hotel_or_tour_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(invoice_id)
        .bind(item.service_id)
        .bind(&item.client_name)
        .bind(item.arrival_date)
        .bind(&item.service_type)
        .bind(&item.service_name)
        .bind(item.service_date)
        .bind(item.cost_price)
        .bind(item.selling_price)
        .bind(item.profit)
        .bind(&item.nights_or_hours)
        .bind(&item.city)
        .bind(&item.hotel_or_tour_name)
        .execute(&mut *conn)
        .await?;
    }

    tracing::debug!("🧾 {} líneas insertadas en la factura {}", items.len(), invoice_id);
    Ok(())
}
