//! Combined sales return repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for combined sales return documents
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: PgPool,
}

impl ReturnRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a return header
    pub async fn get(&self, id: Uuid) -> Result<ReturnRow, DatabaseError> {
        sqlx::query_as::<_, ReturnRow>(
            r#"
            SELECT
                id, company, customer_id, posting_date, currency, status,
                create_delivery_note, submit_credit_notes, total_qty, total,
                total_taxes, grand_total, in_words, created_at, updated_at
            FROM combined_sales_returns
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Combined Sales Return", id))
    }

    /// Retrieves the lines of a return in row order
    pub async fn get_items(&self, parent: Uuid) -> Result<Vec<ReturnItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReturnItemRow>(
            r#"
            SELECT
                id, parent, idx, linked_invoice, sales_invoice_item, item_code,
                item_name, uom, territory, original_qty, qty, rate, total_amount,
                vat_rate_ratio, vat_amount, already_returned_qty, draft_returned_qty
            FROM combined_sales_return_items
            WHERE parent = $1
            ORDER BY idx
            "#,
        )
        .bind(parent)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists return headers of a customer, newest first
    pub async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<ReturnRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReturnRow>(
            r#"
            SELECT
                id, company, customer_id, posting_date, currency, status,
                create_delivery_note, submit_credit_notes, total_qty, total,
                total_taxes, grand_total, in_words, created_at, updated_at
            FROM combined_sales_returns
            WHERE customer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts a return header and its lines
    pub async fn insert(
        conn: &mut PgConnection,
        header: &ReturnRow,
        items: &[ReturnItemRow],
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO combined_sales_returns (
                id, company, customer_id, posting_date, currency, status,
                create_delivery_note, submit_credit_notes, total_qty, total,
                total_taxes, grand_total, in_words, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15
            )
            "#,
        )
        .bind(header.id)
        .bind(&header.company)
        .bind(header.customer_id)
        .bind(header.posting_date)
        .bind(&header.currency)
        .bind(&header.status)
        .bind(header.create_delivery_note)
        .bind(header.submit_credit_notes)
        .bind(header.total_qty)
        .bind(header.total)
        .bind(header.total_taxes)
        .bind(header.grand_total)
        .bind(&header.in_words)
        .bind(header.created_at)
        .bind(header.updated_at)
        .execute(&mut *conn)
        .await?;

        Self::insert_items(conn, items).await
    }

    /// Replaces a return header and all of its lines
    pub async fn update(
        conn: &mut PgConnection,
        header: &ReturnRow,
        items: &[ReturnItemRow],
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE combined_sales_returns SET
                company = $2,
                customer_id = $3,
                posting_date = $4,
                currency = $5,
                status = $6,
                create_delivery_note = $7,
                submit_credit_notes = $8,
                total_qty = $9,
                total = $10,
                total_taxes = $11,
                grand_total = $12,
                in_words = $13,
                updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(header.id)
        .bind(&header.company)
        .bind(header.customer_id)
        .bind(header.posting_date)
        .bind(&header.currency)
        .bind(&header.status)
        .bind(header.create_delivery_note)
        .bind(header.submit_credit_notes)
        .bind(header.total_qty)
        .bind(header.total)
        .bind(header.total_taxes)
        .bind(header.grand_total)
        .bind(&header.in_words)
        .bind(header.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Combined Sales Return", header.id));
        }

        sqlx::query("DELETE FROM combined_sales_return_items WHERE parent = $1")
            .bind(header.id)
            .execute(&mut *conn)
            .await?;

        Self::insert_items(conn, items).await
    }

    async fn insert_items(conn: &mut PgConnection, items: &[ReturnItemRow]) -> Result<(), DatabaseError> {
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO combined_sales_return_items (
                    id, parent, idx, linked_invoice, sales_invoice_item, item_code,
                    item_name, uom, territory, original_qty, qty, rate, total_amount,
                    vat_rate_ratio, vat_amount, already_returned_qty, draft_returned_qty
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17
                )
                "#,
            )
            .bind(item.id)
            .bind(item.parent)
            .bind(item.idx)
            .bind(item.linked_invoice)
            .bind(item.sales_invoice_item)
            .bind(&item.item_code)
            .bind(&item.item_name)
            .bind(&item.uom)
            .bind(&item.territory)
            .bind(item.original_qty)
            .bind(item.qty)
            .bind(item.rate)
            .bind(item.total_amount)
            .bind(item.vat_rate_ratio)
            .bind(item.vat_amount)
            .bind(item.already_returned_qty)
            .bind(item.draft_returned_qty)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}

/// Database row for a combined sales return header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReturnRow {
    pub id: Uuid,
    pub company: String,
    pub customer_id: Uuid,
    pub posting_date: NaiveDate,
    pub currency: String,
    pub status: String,
    pub create_delivery_note: bool,
    pub submit_credit_notes: bool,
    pub total_qty: Decimal,
    pub total: Decimal,
    pub total_taxes: Decimal,
    pub grand_total: Decimal,
    pub in_words: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a combined sales return line
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReturnItemRow {
    pub id: Uuid,
    pub parent: Uuid,
    pub idx: i32,
    pub linked_invoice: Option<Uuid>,
    pub sales_invoice_item: Option<Uuid>,
    pub item_code: String,
    pub item_name: Option<String>,
    pub uom: Option<String>,
    pub territory: Option<String>,
    pub original_qty: Decimal,
    pub qty: Decimal,
    pub rate: Decimal,
    pub total_amount: Decimal,
    pub vat_rate_ratio: Decimal,
    pub vat_amount: Decimal,
    pub already_returned_qty: Decimal,
    pub draft_returned_qty: Decimal,
}
