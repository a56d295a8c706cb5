//! PostgreSQL ERP Adapter
//!
//! Implements `SalesLedgerPort` and `ReturnDocumentPort` over the sales and
//! return repositories. Every write that touches more than one document
//! runs in a single transaction: a failing insert rolls back the whole
//! batch, including the submitted return header.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use core_kernel::{
    AdapterHealth, Currency, CustomerId, DeliveryNoteId, DomainPort, HealthCheckResult,
    HealthCheckable, Money, OperationMetadata, PortError, SalesInvoiceId, SalesInvoiceItemId,
    SalesReturnId,
};
use domain_returns::{CombinedSalesReturn, ReturnDocumentPort, ReturnLine, ReturnStatus};
use domain_sales::{
    BatchReceipt, ChargeType, DeliveryNote, DeliveryNoteItem, DocStatus, DocumentBatch,
    InvoiceLineFilter, InvoiceLineRecord, ReturnedQtyRow, SalesInvoice, SalesInvoiceItem,
    SalesLedgerPort, SalesTaxCharge,
};

use crate::error::DatabaseError;
use crate::repositories::returns::{ReturnItemRow, ReturnRepository, ReturnRow};
use crate::repositories::sales::{
    DeliveryNoteItemRow, DeliveryNoteRow, InvoiceLineRow, SalesInvoiceItemRow, SalesInvoiceRow,
    SalesRepository, SalesTaxRow,
};

const ADAPTER_ID: &str = "postgres-erp-adapter";

/// PostgreSQL-backed sales ledger and return store
#[derive(Debug, Clone)]
pub struct PostgresErpAdapter {
    sales: SalesRepository,
    returns: ReturnRepository,
    pool: PgPool,
}

impl PostgresErpAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            sales: SalesRepository::new(pool.clone()),
            returns: ReturnRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn sales_repository(&self) -> &SalesRepository {
        &self.sales
    }

    async fn load_invoice(&self, id: SalesInvoiceId) -> Result<SalesInvoice, DatabaseError> {
        let uuid = *id.as_uuid();
        let header = self.sales.get_invoice(uuid).await?;
        let items = self.sales.get_invoice_items(uuid).await?;
        let taxes = self.sales.get_invoice_taxes(uuid).await?;
        invoice_from_rows(header, items, taxes)
    }

    async fn load_delivery_note(&self, id: DeliveryNoteId) -> Result<DeliveryNote, DatabaseError> {
        let uuid = *id.as_uuid();
        let header = self.sales.get_delivery_note(uuid).await?;
        let items = self.sales.get_delivery_note_items(uuid).await?;
        delivery_note_from_rows(header, items)
    }

    async fn load_return(&self, row: ReturnRow) -> Result<CombinedSalesReturn, DatabaseError> {
        let items = self.returns.get_items(row.id).await?;
        return_from_rows(row, items)
    }

    async fn write_batch(conn: &mut sqlx::PgConnection, batch: &DocumentBatch) -> Result<(), DatabaseError> {
        for invoice in &batch.sales_invoices {
            let (header, items, taxes) = invoice_to_rows(invoice);
            SalesRepository::insert_invoice(conn, &header, &items, &taxes).await?;
        }
        for note in &batch.delivery_notes {
            let (header, items) = delivery_note_to_rows(note);
            SalesRepository::insert_delivery_note(conn, &header, &items).await?;
        }
        Ok(())
    }
}

impl DomainPort for PostgresErpAdapter {}

#[async_trait]
impl HealthCheckable for PostgresErpAdapter {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl SalesLedgerPort for PostgresErpAdapter {
    #[instrument(skip_all, fields(invoice = %id))]
    async fn get_sales_invoice(
        &self,
        id: SalesInvoiceId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<SalesInvoice, PortError> {
        debug!("Fetching sales invoice");
        Ok(self.load_invoice(id).await?)
    }

    #[instrument(skip_all, fields(invoice_item = %id))]
    async fn get_sales_invoice_item(
        &self,
        id: SalesInvoiceItemId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<SalesInvoiceItem, PortError> {
        let row = self.sales.get_invoice_item(*id.as_uuid()).await?;
        let header = self.sales.get_invoice(row.parent).await?;
        let currency = parse_currency(&header.currency)?;
        Ok(invoice_item_from_row(row, currency)?)
    }

    #[instrument(skip_all, fields(delivery_note = %id))]
    async fn get_delivery_note(
        &self,
        id: DeliveryNoteId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<DeliveryNote, PortError> {
        debug!("Fetching delivery note");
        Ok(self.load_delivery_note(id).await?)
    }

    #[instrument(skip_all)]
    async fn find_invoice_lines(
        &self,
        filter: InvoiceLineFilter,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<InvoiceLineRecord>, PortError> {
        let rows = match &filter {
            InvoiceLineFilter::Customer { customer, item_code } => {
                self.sales
                    .find_invoice_lines(Some(*customer.as_uuid()), None, item_code.as_deref())
                    .await?
            }
            InvoiceLineFilter::Invoice(invoice) => {
                self.sales
                    .find_invoice_lines(None, Some(*invoice.as_uuid()), None)
                    .await?
            }
        };
        debug!(count = rows.len(), "Fetched invoice lines");

        let records = rows
            .into_iter()
            .map(invoice_line_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    #[instrument(skip_all, fields(invoice = %invoice))]
    async fn submitted_invoice_taxes(
        &self,
        invoice: SalesInvoiceId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<SalesTaxCharge>, PortError> {
        let rows = self.sales.get_submitted_invoice_taxes(*invoice.as_uuid()).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let header = self.sales.get_invoice(*invoice.as_uuid()).await?;
        let currency = parse_currency(&header.currency)?;

        let taxes = rows
            .into_iter()
            .map(|row| tax_from_row(row, currency))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(taxes)
    }

    #[instrument(skip_all, fields(invoice = %invoice, invoice_item = %invoice_item))]
    async fn returned_qty_by_status(
        &self,
        invoice: SalesInvoiceId,
        invoice_item: SalesInvoiceItemId,
        exclude_return: Option<SalesReturnId>,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<ReturnedQtyRow>, PortError> {
        let rows = self
            .sales
            .returned_qty_by_status(
                *invoice.as_uuid(),
                *invoice_item.as_uuid(),
                exclude_return.map(|id| *id.as_uuid()),
            )
            .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(ReturnedQtyRow {
                docstatus: parse_docstatus(row.docstatus)?,
                qty: row.qty.unwrap_or(Decimal::ZERO),
            });
        }
        Ok(result)
    }

    #[instrument(skip_all, fields(documents = batch.len()))]
    async fn persist_batch(
        &self,
        batch: DocumentBatch,
        _metadata: Option<OperationMetadata>,
    ) -> Result<BatchReceipt, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Self::write_batch(&mut tx, &batch).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        info!("Stored document batch");
        Ok(BatchReceipt::for_batch(&batch))
    }
}

#[async_trait]
impl ReturnDocumentPort for PostgresErpAdapter {
    #[instrument(skip_all, fields(sales_return = %id))]
    async fn get_return(
        &self,
        id: SalesReturnId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<CombinedSalesReturn, PortError> {
        let row = self.returns.get(*id.as_uuid()).await?;
        Ok(self.load_return(row).await?)
    }

    #[instrument(skip_all, fields(sales_return = %doc.id))]
    async fn insert_return(
        &self,
        doc: CombinedSalesReturn,
        _metadata: Option<OperationMetadata>,
    ) -> Result<CombinedSalesReturn, PortError> {
        let (header, items) = return_to_rows(&doc);
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        ReturnRepository::insert(&mut tx, &header, &items).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(doc)
    }

    #[instrument(skip_all, fields(sales_return = %doc.id))]
    async fn update_return(
        &self,
        doc: CombinedSalesReturn,
        _metadata: Option<OperationMetadata>,
    ) -> Result<CombinedSalesReturn, PortError> {
        let (header, items) = return_to_rows(&doc);
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        ReturnRepository::update(&mut tx, &header, &items).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(doc)
    }

    #[instrument(skip_all, fields(customer = %customer))]
    async fn list_returns(
        &self,
        customer: CustomerId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<CombinedSalesReturn>, PortError> {
        let rows = self.returns.list_by_customer(*customer.as_uuid()).await?;
        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            docs.push(self.load_return(row).await?);
        }
        Ok(docs)
    }

    #[instrument(skip_all, fields(sales_return = %doc.id, documents = batch.len()))]
    async fn finalize_return(
        &self,
        doc: CombinedSalesReturn,
        batch: DocumentBatch,
        _metadata: Option<OperationMetadata>,
    ) -> Result<BatchReceipt, PortError> {
        let (header, items) = return_to_rows(&doc);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        ReturnRepository::update(&mut tx, &header, &items).await?;
        Self::write_batch(&mut tx, &batch).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        info!("Finalized combined sales return");
        Ok(BatchReceipt::for_batch(&batch))
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    code.parse()
        .map_err(|_| DatabaseError::invalid_data(format!("unknown currency '{}'", code)))
}

fn parse_docstatus(code: i16) -> Result<DocStatus, DatabaseError> {
    DocStatus::from_code(code)
        .ok_or_else(|| DatabaseError::invalid_data(format!("unknown docstatus {}", code)))
}

fn invoice_from_rows(
    header: SalesInvoiceRow,
    items: Vec<SalesInvoiceItemRow>,
    taxes: Vec<SalesTaxRow>,
) -> Result<SalesInvoice, DatabaseError> {
    let currency = parse_currency(&header.currency)?;

    Ok(SalesInvoice {
        id: SalesInvoiceId::from_uuid(header.id),
        company: header.company,
        customer: CustomerId::from_uuid(header.customer_id),
        posting_date: header.posting_date,
        currency,
        docstatus: parse_docstatus(header.docstatus)?,
        is_return: header.is_return,
        return_against: header.return_against.map(SalesInvoiceId::from_uuid),
        taxes_and_charges: header.taxes_and_charges,
        update_outstanding_for_self: header.update_outstanding_for_self,
        combined_sales_return: header.combined_sales_return.map(SalesReturnId::from_uuid),
        items: items
            .into_iter()
            .map(|row| invoice_item_from_row(row, currency))
            .collect::<Result<_, _>>()?,
        taxes: taxes
            .into_iter()
            .map(|row| tax_from_row(row, currency))
            .collect::<Result<_, _>>()?,
        net_total: Money::new(header.net_total, currency),
        total_taxes_and_charges: Money::new(header.total_taxes_and_charges, currency),
        grand_total: Money::new(header.grand_total, currency),
        created_at: header.created_at,
        updated_at: header.updated_at,
    })
}

fn invoice_item_from_row(row: SalesInvoiceItemRow, currency: Currency) -> Result<SalesInvoiceItem, DatabaseError> {
    Ok(SalesInvoiceItem {
        id: SalesInvoiceItemId::from_uuid(row.id),
        parent: SalesInvoiceId::from_uuid(row.parent),
        idx: row.idx.max(0) as u32,
        item_code: row.item_code,
        item_name: row.item_name,
        description: row.description,
        qty: row.qty,
        rate: Money::new(row.rate, currency),
        amount: Money::new(row.amount, currency),
        net_amount: Money::new(row.net_amount, currency),
        uom: row.uom,
        territory: row.territory,
        warehouse: row.warehouse,
        delivery_note: row.delivery_note.map(DeliveryNoteId::from_uuid),
        dn_detail: row.dn_detail.map(Into::into),
        sales_invoice_item: row.sales_invoice_item.map(SalesInvoiceItemId::from_uuid),
    })
}

fn tax_from_row(row: SalesTaxRow, currency: Currency) -> Result<SalesTaxCharge, DatabaseError> {
    let charge_type = ChargeType::parse(&row.charge_type).ok_or_else(|| {
        DatabaseError::invalid_data(format!("unknown charge type '{}'", row.charge_type))
    })?;

    Ok(SalesTaxCharge {
        idx: row.idx.max(0) as u32,
        charge_type,
        row_id: row.row_id.map(|r| r.max(0) as u32),
        account_head: row.account_head,
        description: row.description,
        rate: row.rate,
        included_in_print_rate: row.included_in_print_rate,
        cost_center: row.cost_center,
        tax_amount: Money::new(row.tax_amount, currency),
        total: Money::new(row.total, currency),
    })
}

fn invoice_to_rows(invoice: &SalesInvoice) -> (SalesInvoiceRow, Vec<SalesInvoiceItemRow>, Vec<SalesTaxRow>) {
    let parent = *invoice.id.as_uuid();

    let header = SalesInvoiceRow {
        id: parent,
        company: invoice.company.clone(),
        customer_id: *invoice.customer.as_uuid(),
        posting_date: invoice.posting_date,
        currency: invoice.currency.code().to_string(),
        docstatus: invoice.docstatus.code(),
        is_return: invoice.is_return,
        return_against: invoice.return_against.map(|id| *id.as_uuid()),
        taxes_and_charges: invoice.taxes_and_charges.clone(),
        update_outstanding_for_self: invoice.update_outstanding_for_self,
        combined_sales_return: invoice.combined_sales_return.map(|id| *id.as_uuid()),
        net_total: invoice.net_total.amount(),
        total_taxes_and_charges: invoice.total_taxes_and_charges.amount(),
        grand_total: invoice.grand_total.amount(),
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    };

    let items = invoice
        .items
        .iter()
        .map(|item| SalesInvoiceItemRow {
            id: *item.id.as_uuid(),
            parent,
            idx: item.idx as i32,
            item_code: item.item_code.clone(),
            item_name: item.item_name.clone(),
            description: item.description.clone(),
            qty: item.qty,
            rate: item.rate.amount(),
            amount: item.amount.amount(),
            net_amount: item.net_amount.amount(),
            uom: item.uom.clone(),
            territory: item.territory.clone(),
            warehouse: item.warehouse.clone(),
            delivery_note: item.delivery_note.map(|id| *id.as_uuid()),
            dn_detail: item.dn_detail.map(|id| *id.as_uuid()),
            sales_invoice_item: item.sales_invoice_item.map(|id| *id.as_uuid()),
        })
        .collect();

    let taxes = invoice
        .taxes
        .iter()
        .map(|tax| SalesTaxRow {
            parent,
            idx: tax.idx as i32,
            charge_type: tax.charge_type.as_str().to_string(),
            row_id: tax.row_id.map(|r| r as i32),
            account_head: tax.account_head.clone(),
            description: tax.description.clone(),
            rate: tax.rate,
            included_in_print_rate: tax.included_in_print_rate,
            cost_center: tax.cost_center.clone(),
            tax_amount: tax.tax_amount.amount(),
            total: tax.total.amount(),
        })
        .collect();

    (header, items, taxes)
}

fn delivery_note_from_rows(
    header: DeliveryNoteRow,
    items: Vec<DeliveryNoteItemRow>,
) -> Result<DeliveryNote, DatabaseError> {
    Ok(DeliveryNote {
        id: DeliveryNoteId::from_uuid(header.id),
        company: header.company,
        customer: CustomerId::from_uuid(header.customer_id),
        posting_date: header.posting_date,
        docstatus: parse_docstatus(header.docstatus)?,
        is_return: header.is_return,
        return_against: header.return_against.map(DeliveryNoteId::from_uuid),
        combined_sales_return: header.combined_sales_return.map(SalesReturnId::from_uuid),
        items: items
            .into_iter()
            .map(|row| DeliveryNoteItem {
                id: row.id.into(),
                idx: row.idx.max(0) as u32,
                item_code: row.item_code,
                qty: row.qty,
                uom: row.uom,
                warehouse: row.warehouse,
                delivery_note_item: row.delivery_note_item.map(Into::into),
            })
            .collect(),
        created_at: header.created_at,
        updated_at: header.updated_at,
    })
}

fn delivery_note_to_rows(note: &DeliveryNote) -> (DeliveryNoteRow, Vec<DeliveryNoteItemRow>) {
    let parent = *note.id.as_uuid();

    let header = DeliveryNoteRow {
        id: parent,
        company: note.company.clone(),
        customer_id: *note.customer.as_uuid(),
        posting_date: note.posting_date,
        docstatus: note.docstatus.code(),
        is_return: note.is_return,
        return_against: note.return_against.map(|id| *id.as_uuid()),
        combined_sales_return: note.combined_sales_return.map(|id| *id.as_uuid()),
        created_at: note.created_at,
        updated_at: note.updated_at,
    };

    let items = note
        .items
        .iter()
        .map(|item| DeliveryNoteItemRow {
            id: *item.id.as_uuid(),
            parent,
            idx: item.idx as i32,
            item_code: item.item_code.clone(),
            qty: item.qty,
            uom: item.uom.clone(),
            warehouse: item.warehouse.clone(),
            delivery_note_item: item.delivery_note_item.map(|id| *id.as_uuid()),
        })
        .collect();

    (header, items)
}

fn invoice_line_from_row(row: InvoiceLineRow) -> Result<InvoiceLineRecord, DatabaseError> {
    let currency = parse_currency(&row.currency)?;

    Ok(InvoiceLineRecord {
        sales_invoice: SalesInvoiceId::from_uuid(row.sales_invoice),
        invoice_item_row: SalesInvoiceItemId::from_uuid(row.invoice_item_row),
        sales_invoice_date: row.sales_invoice_date,
        item_code: row.item_code,
        item_name: row.item_name,
        description: row.description,
        qty: row.qty,
        rate: Money::new(row.rate, currency),
        amount: Money::new(row.amount, currency),
        uom: row.uom,
        territory: row.territory,
    })
}

fn return_from_rows(header: ReturnRow, items: Vec<ReturnItemRow>) -> Result<CombinedSalesReturn, DatabaseError> {
    let currency = parse_currency(&header.currency)?;
    let status = ReturnStatus::parse(&header.status).ok_or_else(|| {
        DatabaseError::invalid_data(format!("unknown return status '{}'", header.status))
    })?;

    let lines = items
        .into_iter()
        .map(|row| ReturnLine {
            id: row.id.into(),
            idx: row.idx.max(0) as u32,
            linked_invoice: row.linked_invoice.map(SalesInvoiceId::from_uuid),
            sales_invoice_item: row.sales_invoice_item.map(SalesInvoiceItemId::from_uuid),
            item_code: row.item_code,
            item_name: row.item_name,
            uom: row.uom,
            territory: row.territory,
            original_qty: row.original_qty,
            qty: row.qty,
            rate: Money::new(row.rate, currency),
            total_amount: Money::new(row.total_amount, currency),
            vat_rate_ratio: row.vat_rate_ratio,
            vat_amount: Money::new(row.vat_amount, currency),
            already_returned_qty: row.already_returned_qty,
            draft_returned_qty: row.draft_returned_qty,
        })
        .collect();

    Ok(CombinedSalesReturn {
        id: SalesReturnId::from_uuid(header.id),
        company: header.company,
        customer: CustomerId::from_uuid(header.customer_id),
        posting_date: header.posting_date,
        currency,
        status,
        create_delivery_note: header.create_delivery_note,
        submit_credit_notes: header.submit_credit_notes,
        items: lines,
        total_qty: header.total_qty,
        total: Money::new(header.total, currency),
        total_taxes: Money::new(header.total_taxes, currency),
        grand_total: Money::new(header.grand_total, currency),
        in_words: header.in_words,
        created_at: header.created_at,
        updated_at: header.updated_at,
    })
}

fn return_to_rows(doc: &CombinedSalesReturn) -> (ReturnRow, Vec<ReturnItemRow>) {
    let parent = *doc.id.as_uuid();

    let header = ReturnRow {
        id: parent,
        company: doc.company.clone(),
        customer_id: *doc.customer.as_uuid(),
        posting_date: doc.posting_date,
        currency: doc.currency.code().to_string(),
        status: doc.status.as_str().to_string(),
        create_delivery_note: doc.create_delivery_note,
        submit_credit_notes: doc.submit_credit_notes,
        total_qty: doc.total_qty,
        total: doc.total.amount(),
        total_taxes: doc.total_taxes.amount(),
        grand_total: doc.grand_total.amount(),
        in_words: doc.in_words.clone(),
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    };

    let items = doc
        .items
        .iter()
        .map(|line| ReturnItemRow {
            id: *line.id.as_uuid(),
            parent,
            idx: line.idx as i32,
            linked_invoice: line.linked_invoice.map(|id| *id.as_uuid()),
            sales_invoice_item: line.sales_invoice_item.map(|id| *id.as_uuid()),
            item_code: line.item_code.clone(),
            item_name: line.item_name.clone(),
            uom: line.uom.clone(),
            territory: line.territory.clone(),
            original_qty: line.original_qty,
            qty: line.qty,
            rate: line.rate.amount(),
            total_amount: line.total_amount.amount(),
            vat_rate_ratio: line.vat_rate_ratio,
            vat_amount: line.vat_amount.amount(),
            already_returned_qty: line.already_returned_qty,
            draft_returned_qty: line.draft_returned_qty,
        })
        .collect();

    (header, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
    }

    fn credit_note() -> SalesInvoice {
        let mut original = SalesInvoice::new("Acme KSA", CustomerId::new_v7(), date(), Currency::SAR);
        original.add_item(SalesInvoiceItem::new("WIDGET", dec!(10), Money::new(dec!(20), Currency::SAR)));

        let mut note = SalesInvoice::new_return_against(&original, date());
        note.combined_sales_return = Some(SalesReturnId::new_v7());
        note.add_item(
            SalesInvoiceItem::new("WIDGET", dec!(-4), Money::new(dec!(20), Currency::SAR))
                .with_sales_invoice_item(original.items[0].id),
        );
        note.add_tax(SalesTaxCharge::new(ChargeType::OnNetTotal, "VAT 15% - AK", dec!(15), Currency::SAR));
        note.calculate_taxes_and_totals().unwrap();
        note
    }

    #[test]
    fn test_invoice_rows_map_back_to_the_same_document() {
        let note = credit_note();
        let (header, items, taxes) = invoice_to_rows(&note);

        assert_eq!(header.docstatus, 0);
        assert_eq!(taxes[0].charge_type, "On Net Total");

        let restored = invoice_from_rows(header, items, taxes).unwrap();
        assert_eq!(restored.id, note.id);
        assert_eq!(restored.return_against, note.return_against);
        assert_eq!(restored.combined_sales_return, note.combined_sales_return);
        assert_eq!(restored.items[0].qty, dec!(-4));
        assert_eq!(restored.items[0].sales_invoice_item, note.items[0].sales_invoice_item);
        assert_eq!(restored.grand_total, note.grand_total);
    }

    #[test]
    fn test_unknown_stored_values_are_rejected() {
        let (mut header, items, taxes) = invoice_to_rows(&credit_note());
        header.currency = "XXX".to_string();
        assert!(matches!(
            invoice_from_rows(header, items, taxes),
            Err(DatabaseError::InvalidData(_))
        ));

        assert!(parse_docstatus(7).is_err());
    }

    #[test]
    fn test_return_rows_keep_status_and_lines() {
        let mut doc = CombinedSalesReturn::new("Acme KSA", CustomerId::new_v7(), date(), Currency::SAR);
        doc.add_line(ReturnLine::new("WIDGET", dec!(3), Money::new(dec!(20), Currency::SAR)));
        doc.begin_validation().unwrap();

        let (header, items) = return_to_rows(&doc);
        assert_eq!(header.status, "validating");
        assert_eq!(items[0].idx, 1);

        let restored = return_from_rows(header, items).unwrap();
        assert_eq!(restored.status, ReturnStatus::Validating);
        assert_eq!(restored.items[0].qty, dec!(3));
        assert_eq!(restored.items[0].id, doc.items[0].id);
    }
}
