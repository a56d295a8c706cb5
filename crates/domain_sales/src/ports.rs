//! Sales Ledger Port
//!
//! The sales ledger owns sales invoices, delivery notes and the returns
//! raised against them. Everything the returns domain needs from it goes
//! through [`SalesLedgerPort`]:
//!
//! - document lookups (invoice, invoice line, delivery note)
//! - the returnable invoice line query
//! - the per-status returned quantity aggregate
//! - atomic persistence of generated documents
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_sales::ports::SalesLedgerPort;
//! use std::sync::Arc;
//!
//! pub struct CreditNoteService {
//!     ledger: Arc<dyn SalesLedgerPort>,
//! }
//!
//! impl CreditNoteService {
//!     pub async fn source(&self, id: SalesInvoiceId) -> Result<SalesInvoice, PortError> {
//!         self.ledger.get_sales_invoice(id, None).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    CustomerId, DeliveryNoteId, DomainPort, HealthCheckable, Money, OperationMetadata, PortError,
    SalesInvoiceId, SalesInvoiceItemId, SalesReturnId,
};

use crate::delivery_note::DeliveryNote;
use crate::invoice::{SalesInvoice, SalesInvoiceItem};
use crate::status::DocStatus;
use crate::taxes::SalesTaxCharge;

/// Selection for the returnable invoice line query
///
/// Only lines of submitted, non-return invoices are ever selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceLineFilter {
    /// Every invoice of a customer, optionally narrowed to one item code
    ///
    /// When an item code is given, results are ordered newest invoice first.
    Customer {
        customer: CustomerId,
        item_code: Option<String>,
    },
    /// A single invoice
    Invoice(SalesInvoiceId),
}

/// A returnable invoice line as read from the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineRecord {
    pub sales_invoice: SalesInvoiceId,
    pub invoice_item_row: SalesInvoiceItemId,
    pub sales_invoice_date: NaiveDate,
    pub item_code: String,
    pub item_name: Option<String>,
    pub description: Option<String>,
    pub qty: Decimal,
    pub rate: Money,
    pub amount: Money,
    pub uom: Option<String>,
    pub territory: Option<String>,
}

/// Absolute returned quantity for one document status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnedQtyRow {
    pub docstatus: DocStatus,
    pub qty: Decimal,
}

/// Generated documents to be stored together
#[derive(Debug, Clone, Default)]
pub struct DocumentBatch {
    pub sales_invoices: Vec<SalesInvoice>,
    pub delivery_notes: Vec<DeliveryNote>,
}

impl DocumentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sales_invoices.is_empty() && self.delivery_notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sales_invoices.len() + self.delivery_notes.len()
    }
}

/// Names of the documents stored by a batch, in batch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    pub sales_invoices: Vec<SalesInvoiceId>,
    pub delivery_notes: Vec<DeliveryNoteId>,
}

impl BatchReceipt {
    pub fn for_batch(batch: &DocumentBatch) -> Self {
        Self {
            sales_invoices: batch.sales_invoices.iter().map(|d| d.id).collect(),
            delivery_notes: batch.delivery_notes.iter().map(|d| d.id).collect(),
        }
    }
}

/// Port trait for sales ledger access
///
/// All methods take optional [`OperationMetadata`] for tracing and audit.
#[async_trait]
pub trait SalesLedgerPort: DomainPort + HealthCheckable {
    /// Retrieves a sales invoice with its items and tax schedule
    ///
    /// # Returns
    ///
    /// The invoice if found, or `PortError::NotFound`
    async fn get_sales_invoice(
        &self,
        id: SalesInvoiceId,
        metadata: Option<OperationMetadata>,
    ) -> Result<SalesInvoice, PortError>;

    /// Retrieves a single invoice line
    async fn get_sales_invoice_item(
        &self,
        id: SalesInvoiceItemId,
        metadata: Option<OperationMetadata>,
    ) -> Result<SalesInvoiceItem, PortError>;

    /// Retrieves a delivery note with its items
    async fn get_delivery_note(
        &self,
        id: DeliveryNoteId,
        metadata: Option<OperationMetadata>,
    ) -> Result<DeliveryNote, PortError>;

    /// Lists returnable lines of submitted, non-return invoices
    async fn find_invoice_lines(
        &self,
        filter: InvoiceLineFilter,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<InvoiceLineRecord>, PortError>;

    /// Tax schedule of an invoice, empty unless the invoice is submitted
    async fn submitted_invoice_taxes(
        &self,
        invoice: SalesInvoiceId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<SalesTaxCharge>, PortError>;

    /// Quantity already returned against one invoice line, per status
    ///
    /// Considers return invoices whose `return_against` is `invoice` and
    /// whose items reference `invoice_item`. Each row carries the absolute
    /// summed quantity for one status; statuses without returns are absent.
    /// Draft documents generated by `exclude_return` are left out;
    /// submitted ones always count.
    async fn returned_qty_by_status(
        &self,
        invoice: SalesInvoiceId,
        invoice_item: SalesInvoiceItemId,
        exclude_return: Option<SalesReturnId>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<ReturnedQtyRow>, PortError>;

    /// Stores every document of the batch, or none of them
    async fn persist_batch(
        &self,
        batch: DocumentBatch,
        metadata: Option<OperationMetadata>,
    ) -> Result<BatchReceipt, PortError>;

    // ========================================================================
    // Convenience Methods
    // ========================================================================

    /// Returns true if the invoice exists
    async fn invoice_exists(
        &self,
        id: SalesInvoiceId,
        metadata: Option<OperationMetadata>,
    ) -> Result<bool, PortError> {
        match self.get_sales_invoice(id, metadata).await {
            Ok(_) => Ok(true),
            Err(PortError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
