//! Sales ledger repository
//!
//! Database access for sales invoices, credit notes, delivery notes and
//! delivery note returns. Reads go through the pool; writes take an open
//! connection so callers can group several documents in one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for sales ledger documents
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    /// Creates a new SalesRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Sales invoices
    // ========================================================================

    /// Retrieves an invoice header
    pub async fn get_invoice(&self, id: Uuid) -> Result<SalesInvoiceRow, DatabaseError> {
        sqlx::query_as::<_, SalesInvoiceRow>(
            r#"
            SELECT
                id, company, customer_id, posting_date, currency, docstatus,
                is_return, return_against, taxes_and_charges,
                update_outstanding_for_self, combined_sales_return,
                net_total, total_taxes_and_charges, grand_total,
                created_at, updated_at
            FROM sales_invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Sales Invoice", id))
    }

    /// Retrieves the item lines of an invoice in row order
    pub async fn get_invoice_items(&self, parent: Uuid) -> Result<Vec<SalesInvoiceItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, SalesInvoiceItemRow>(
            r#"
            SELECT
                id, parent, idx, item_code, item_name, description, qty, rate,
                amount, net_amount, uom, territory, warehouse, delivery_note,
                dn_detail, sales_invoice_item
            FROM sales_invoice_items
            WHERE parent = $1
            ORDER BY idx
            "#,
        )
        .bind(parent)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Retrieves a single invoice line
    pub async fn get_invoice_item(&self, id: Uuid) -> Result<SalesInvoiceItemRow, DatabaseError> {
        sqlx::query_as::<_, SalesInvoiceItemRow>(
            r#"
            SELECT
                id, parent, idx, item_code, item_name, description, qty, rate,
                amount, net_amount, uom, territory, warehouse, delivery_note,
                dn_detail, sales_invoice_item
            FROM sales_invoice_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Sales Invoice Item", id))
    }

    /// Retrieves the tax schedule of an invoice in row order
    pub async fn get_invoice_taxes(&self, parent: Uuid) -> Result<Vec<SalesTaxRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, SalesTaxRow>(
            r#"
            SELECT
                parent, idx, charge_type, row_id, account_head, description, rate,
                included_in_print_rate, cost_center, tax_amount, total
            FROM sales_taxes_and_charges
            WHERE parent = $1
            ORDER BY idx
            "#,
        )
        .bind(parent)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Tax schedule of an invoice, only when the invoice is submitted
    pub async fn get_submitted_invoice_taxes(&self, parent: Uuid) -> Result<Vec<SalesTaxRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, SalesTaxRow>(
            r#"
            SELECT
                t.parent, t.idx, t.charge_type, t.row_id, t.account_head,
                t.description, t.rate, t.included_in_print_rate, t.cost_center,
                t.tax_amount, t.total
            FROM sales_taxes_and_charges t
            INNER JOIN sales_invoices si ON si.id = t.parent
            WHERE t.parent = $1
              AND si.docstatus = 1
            ORDER BY t.idx
            "#,
        )
        .bind(parent)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lines of submitted, non-return invoices
    ///
    /// With `customer` every invoice of the customer is searched, narrowed
    /// by `item_code` when given (newest invoice first). Otherwise only
    /// `invoice` is read.
    pub async fn find_invoice_lines(
        &self,
        customer: Option<Uuid>,
        invoice: Option<Uuid>,
        item_code: Option<&str>,
    ) -> Result<Vec<InvoiceLineRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceLineRow>(
            r#"
            SELECT
                sii.parent AS sales_invoice,
                sii.id AS invoice_item_row,
                si.posting_date AS sales_invoice_date,
                sii.item_code,
                sii.item_name,
                sii.description,
                sii.qty,
                sii.rate,
                sii.amount,
                sii.uom,
                sii.territory,
                si.currency
            FROM sales_invoice_items sii
            INNER JOIN sales_invoices si ON sii.parent = si.id
            WHERE si.docstatus = 1
              AND si.is_return = FALSE
              AND ($1::uuid IS NULL OR si.customer_id = $1)
              AND ($2::uuid IS NULL OR si.id = $2)
              AND ($3::text IS NULL OR sii.item_code = $3)
            ORDER BY
                CASE WHEN $3::text IS NULL THEN NULL ELSE si.posting_date END DESC,
                si.posting_date, si.created_at, sii.idx
            "#,
        )
        .bind(customer)
        .bind(invoice)
        .bind(item_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Absolute returned quantity per document status for one invoice line
    ///
    /// Draft credit notes whose backlink is `exclude_return` are ignored.
    pub async fn returned_qty_by_status(
        &self,
        invoice: Uuid,
        invoice_item: Uuid,
        exclude_return: Option<Uuid>,
    ) -> Result<Vec<ReturnedQtyDbRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReturnedQtyDbRow>(
            r#"
            SELECT
                si.docstatus,
                ABS(SUM(sii.qty)) AS qty
            FROM sales_invoices si
            INNER JOIN sales_invoice_items sii ON sii.parent = si.id
            WHERE si.is_return = TRUE
              AND si.return_against = $1
              AND sii.sales_invoice_item = $2
              AND ($3::uuid IS NULL OR si.docstatus <> 0 OR si.combined_sales_return IS DISTINCT FROM $3)
            GROUP BY si.docstatus
            "#,
        )
        .bind(invoice)
        .bind(invoice_item)
        .bind(exclude_return)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts an invoice with its items and taxes
    pub async fn insert_invoice(
        conn: &mut PgConnection,
        invoice: &SalesInvoiceRow,
        items: &[SalesInvoiceItemRow],
        taxes: &[SalesTaxRow],
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO sales_invoices (
                id, company, customer_id, posting_date, currency, docstatus,
                is_return, return_against, taxes_and_charges,
                update_outstanding_for_self, combined_sales_return,
                net_total, total_taxes_and_charges, grand_total,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16
            )
            "#,
        )
        .bind(invoice.id)
        .bind(&invoice.company)
        .bind(invoice.customer_id)
        .bind(invoice.posting_date)
        .bind(&invoice.currency)
        .bind(invoice.docstatus)
        .bind(invoice.is_return)
        .bind(invoice.return_against)
        .bind(&invoice.taxes_and_charges)
        .bind(invoice.update_outstanding_for_self)
        .bind(invoice.combined_sales_return)
        .bind(invoice.net_total)
        .bind(invoice.total_taxes_and_charges)
        .bind(invoice.grand_total)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sales_invoice_items (
                    id, parent, idx, item_code, item_name, description, qty, rate,
                    amount, net_amount, uom, territory, warehouse, delivery_note,
                    dn_detail, sales_invoice_item
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16
                )
                "#,
            )
            .bind(item.id)
            .bind(item.parent)
            .bind(item.idx)
            .bind(&item.item_code)
            .bind(&item.item_name)
            .bind(&item.description)
            .bind(item.qty)
            .bind(item.rate)
            .bind(item.amount)
            .bind(item.net_amount)
            .bind(&item.uom)
            .bind(&item.territory)
            .bind(&item.warehouse)
            .bind(item.delivery_note)
            .bind(item.dn_detail)
            .bind(item.sales_invoice_item)
            .execute(&mut *conn)
            .await?;
        }

        for tax in taxes {
            sqlx::query(
                r#"
                INSERT INTO sales_taxes_and_charges (
                    parent, idx, charge_type, row_id, account_head, description,
                    rate, included_in_print_rate, cost_center, tax_amount, total
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
                )
                "#,
            )
            .bind(tax.parent)
            .bind(tax.idx)
            .bind(&tax.charge_type)
            .bind(tax.row_id)
            .bind(&tax.account_head)
            .bind(&tax.description)
            .bind(tax.rate)
            .bind(tax.included_in_print_rate)
            .bind(&tax.cost_center)
            .bind(tax.tax_amount)
            .bind(tax.total)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    // ========================================================================
    // Delivery notes
    // ========================================================================

    /// Retrieves a delivery note header
    pub async fn get_delivery_note(&self, id: Uuid) -> Result<DeliveryNoteRow, DatabaseError> {
        sqlx::query_as::<_, DeliveryNoteRow>(
            r#"
            SELECT
                id, company, customer_id, posting_date, docstatus, is_return,
                return_against, combined_sales_return, created_at, updated_at
            FROM delivery_notes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Delivery Note", id))
    }

    /// Retrieves the item lines of a delivery note in row order
    pub async fn get_delivery_note_items(&self, parent: Uuid) -> Result<Vec<DeliveryNoteItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, DeliveryNoteItemRow>(
            r#"
            SELECT id, parent, idx, item_code, qty, uom, warehouse, delivery_note_item
            FROM delivery_note_items
            WHERE parent = $1
            ORDER BY idx
            "#,
        )
        .bind(parent)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts a delivery note with its items
    pub async fn insert_delivery_note(
        conn: &mut PgConnection,
        note: &DeliveryNoteRow,
        items: &[DeliveryNoteItemRow],
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO delivery_notes (
                id, company, customer_id, posting_date, docstatus, is_return,
                return_against, combined_sales_return, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
            )
            "#,
        )
        .bind(note.id)
        .bind(&note.company)
        .bind(note.customer_id)
        .bind(note.posting_date)
        .bind(note.docstatus)
        .bind(note.is_return)
        .bind(note.return_against)
        .bind(note.combined_sales_return)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO delivery_note_items (
                    id, parent, idx, item_code, qty, uom, warehouse, delivery_note_item
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8
                )
                "#,
            )
            .bind(item.id)
            .bind(item.parent)
            .bind(item.idx)
            .bind(&item.item_code)
            .bind(item.qty)
            .bind(&item.uom)
            .bind(&item.warehouse)
            .bind(item.delivery_note_item)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

// ============================================================================
// Row types
// ============================================================================

/// Database row for a sales invoice header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SalesInvoiceRow {
    pub id: Uuid,
    pub company: String,
    pub customer_id: Uuid,
    pub posting_date: NaiveDate,
    pub currency: String,
    pub docstatus: i16,
    pub is_return: bool,
    pub return_against: Option<Uuid>,
    pub taxes_and_charges: Option<String>,
    pub update_outstanding_for_self: bool,
    pub combined_sales_return: Option<Uuid>,
    pub net_total: Decimal,
    pub total_taxes_and_charges: Decimal,
    pub grand_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a sales invoice item
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SalesInvoiceItemRow {
    pub id: Uuid,
    pub parent: Uuid,
    pub idx: i32,
    pub item_code: String,
    pub item_name: Option<String>,
    pub description: Option<String>,
    pub qty: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub net_amount: Decimal,
    pub uom: Option<String>,
    pub territory: Option<String>,
    pub warehouse: Option<String>,
    pub delivery_note: Option<Uuid>,
    pub dn_detail: Option<Uuid>,
    pub sales_invoice_item: Option<Uuid>,
}

/// Database row for a sales tax charge
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SalesTaxRow {
    pub parent: Uuid,
    pub idx: i32,
    pub charge_type: String,
    pub row_id: Option<i32>,
    pub account_head: String,
    pub description: Option<String>,
    pub rate: Decimal,
    pub included_in_print_rate: bool,
    pub cost_center: Option<String>,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// A returnable invoice line joined with its invoice header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceLineRow {
    pub sales_invoice: Uuid,
    pub invoice_item_row: Uuid,
    pub sales_invoice_date: NaiveDate,
    pub item_code: String,
    pub item_name: Option<String>,
    pub description: Option<String>,
    pub qty: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub uom: Option<String>,
    pub territory: Option<String>,
    pub currency: String,
}

/// Returned quantity aggregate for one document status
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReturnedQtyDbRow {
    pub docstatus: i16,
    pub qty: Option<Decimal>,
}

/// Database row for a delivery note header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryNoteRow {
    pub id: Uuid,
    pub company: String,
    pub customer_id: Uuid,
    pub posting_date: NaiveDate,
    pub docstatus: i16,
    pub is_return: bool,
    pub return_against: Option<Uuid>,
    pub combined_sales_return: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a delivery note item
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryNoteItemRow {
    pub id: Uuid,
    pub parent: Uuid,
    pub idx: i32,
    pub item_code: String,
    pub qty: Decimal,
    pub uom: Option<String>,
    pub warehouse: Option<String>,
    pub delivery_note_item: Option<Uuid>,
}
