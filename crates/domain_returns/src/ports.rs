//! Return Document Port
//!
//! Storage for combined sales returns. Submission stores the submitted
//! return together with every document it generated through
//! [`ReturnDocumentPort::finalize_return`], so a failure leaves the return
//! in draft with nothing generated.
//!
//! With the `mock` feature the [`mock::InMemoryErp`] adapter implements
//! this port and `domain_sales::SalesLedgerPort` over shared in-memory maps.

use async_trait::async_trait;

use core_kernel::{CustomerId, DomainPort, HealthCheckable, OperationMetadata, PortError, SalesReturnId};
use domain_sales::{BatchReceipt, DocumentBatch};

use crate::document::CombinedSalesReturn;

/// Port trait for return document storage
#[async_trait]
pub trait ReturnDocumentPort: DomainPort + HealthCheckable {
    /// Retrieves a return with its lines
    ///
    /// # Returns
    ///
    /// The return if found, or `PortError::NotFound`
    async fn get_return(
        &self,
        id: SalesReturnId,
        metadata: Option<OperationMetadata>,
    ) -> Result<CombinedSalesReturn, PortError>;

    /// Stores a new return
    ///
    /// Fails with `PortError::Conflict` if the id is already taken.
    async fn insert_return(
        &self,
        doc: CombinedSalesReturn,
        metadata: Option<OperationMetadata>,
    ) -> Result<CombinedSalesReturn, PortError>;

    /// Replaces a stored return, header and lines
    async fn update_return(
        &self,
        doc: CombinedSalesReturn,
        metadata: Option<OperationMetadata>,
    ) -> Result<CombinedSalesReturn, PortError>;

    /// Lists the returns of a customer, newest first
    async fn list_returns(
        &self,
        customer: CustomerId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<CombinedSalesReturn>, PortError>;

    /// Stores the submitted return and its generated documents atomically
    async fn finalize_return(
        &self,
        doc: CombinedSalesReturn,
        batch: DocumentBatch,
        metadata: Option<OperationMetadata>,
    ) -> Result<BatchReceipt, PortError>;
}

/// In-memory adapter for both ports
///
/// Stores every document in memory and is useful for unit testing without
/// a database.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{
        AdapterHealth, DeliveryNoteId, HealthCheckResult, SalesInvoiceId, SalesInvoiceItemId,
    };
    use domain_sales::{
        DeliveryNote, DocStatus, InvoiceLineFilter, InvoiceLineRecord, ReturnedQtyRow,
        SalesInvoice, SalesInvoiceItem, SalesLedgerPort, SalesTaxCharge,
    };

    /// In-memory sales ledger and return store
    #[derive(Debug, Default)]
    pub struct InMemoryErp {
        invoices: Arc<RwLock<HashMap<SalesInvoiceId, SalesInvoice>>>,
        delivery_notes: Arc<RwLock<HashMap<DeliveryNoteId, DeliveryNote>>>,
        returns: Arc<RwLock<HashMap<SalesReturnId, CombinedSalesReturn>>>,
        fail_next_batch: AtomicBool,
    }

    impl InMemoryErp {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with invoices and delivery notes
        pub async fn with_documents(invoices: Vec<SalesInvoice>, delivery_notes: Vec<DeliveryNote>) -> Self {
            let erp = Self::new();
            for invoice in invoices {
                erp.insert_invoice(invoice).await;
            }
            for note in delivery_notes {
                erp.insert_delivery_note(note).await;
            }
            erp
        }

        pub async fn insert_invoice(&self, invoice: SalesInvoice) {
            self.invoices.write().await.insert(invoice.id, invoice);
        }

        pub async fn insert_delivery_note(&self, note: DeliveryNote) {
            self.delivery_notes.write().await.insert(note.id, note);
        }

        /// Makes the next batch write fail without storing anything
        pub fn fail_next_batch(&self) {
            self.fail_next_batch.store(true, Ordering::SeqCst);
        }

        /// Credit notes raised against `invoice`
        pub async fn credit_notes_against(&self, invoice: SalesInvoiceId) -> Vec<SalesInvoice> {
            let mut notes: Vec<_> = self
                .invoices
                .read()
                .await
                .values()
                .filter(|i| i.is_return && i.return_against == Some(invoice))
                .cloned()
                .collect();
            notes.sort_by_key(|n| n.created_at);
            notes
        }

        /// Documents generated by a combined sales return
        pub async fn generated_by(&self, id: SalesReturnId) -> (Vec<SalesInvoice>, Vec<DeliveryNote>) {
            let invoices = self
                .invoices
                .read()
                .await
                .values()
                .filter(|i| i.combined_sales_return == Some(id))
                .cloned()
                .collect();
            let notes = self
                .delivery_notes
                .read()
                .await
                .values()
                .filter(|n| n.combined_sales_return == Some(id))
                .cloned()
                .collect();
            (invoices, notes)
        }

        fn take_failure(&self) -> Result<(), PortError> {
            if self.fail_next_batch.swap(false, Ordering::SeqCst) {
                return Err(PortError::internal("Simulated batch failure"));
            }
            Ok(())
        }

        fn check_batch(
            invoices: &HashMap<SalesInvoiceId, SalesInvoice>,
            notes: &HashMap<DeliveryNoteId, DeliveryNote>,
            batch: &DocumentBatch,
        ) -> Result<(), PortError> {
            if let Some(dup) = batch.sales_invoices.iter().find(|d| invoices.contains_key(&d.id)) {
                return Err(PortError::conflict(format!("{} already exists", dup.name())));
            }
            if let Some(dup) = batch.delivery_notes.iter().find(|d| notes.contains_key(&d.id)) {
                return Err(PortError::conflict(format!("{} already exists", dup.name())));
            }
            Ok(())
        }

        fn store_batch(
            invoices: &mut HashMap<SalesInvoiceId, SalesInvoice>,
            notes: &mut HashMap<DeliveryNoteId, DeliveryNote>,
            batch: DocumentBatch,
        ) -> BatchReceipt {
            let receipt = BatchReceipt::for_batch(&batch);
            for invoice in batch.sales_invoices {
                invoices.insert(invoice.id, invoice);
            }
            for note in batch.delivery_notes {
                notes.insert(note.id, note);
            }
            receipt
        }
    }

    impl DomainPort for InMemoryErp {}

    #[async_trait]
    impl HealthCheckable for InMemoryErp {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "in-memory-erp".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("In-memory adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl SalesLedgerPort for InMemoryErp {
        async fn get_sales_invoice(
            &self,
            id: SalesInvoiceId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<SalesInvoice, PortError> {
            self.invoices
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Sales Invoice", id))
        }

        async fn get_sales_invoice_item(
            &self,
            id: SalesInvoiceItemId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<SalesInvoiceItem, PortError> {
            self.invoices
                .read()
                .await
                .values()
                .flat_map(|invoice| invoice.items.iter())
                .find(|item| item.id == id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Sales Invoice Item", id))
        }

        async fn get_delivery_note(
            &self,
            id: DeliveryNoteId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<DeliveryNote, PortError> {
            self.delivery_notes
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Delivery Note", id))
        }

        async fn find_invoice_lines(
            &self,
            filter: InvoiceLineFilter,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<InvoiceLineRecord>, PortError> {
            let invoices = self.invoices.read().await;
            let mut selected: Vec<&SalesInvoice> = invoices
                .values()
                .filter(|i| i.docstatus == DocStatus::Submitted && !i.is_return)
                .filter(|i| match &filter {
                    InvoiceLineFilter::Customer { customer, .. } => i.customer == *customer,
                    InvoiceLineFilter::Invoice(id) => i.id == *id,
                })
                .collect();
            selected.sort_by_key(|i| (i.posting_date, i.created_at));

            let item_code = match &filter {
                InvoiceLineFilter::Customer { item_code, .. } => item_code.clone(),
                InvoiceLineFilter::Invoice(_) => None,
            };
            if item_code.is_some() {
                selected.reverse();
            }

            Ok(selected
                .into_iter()
                .flat_map(|invoice| {
                    invoice.items.iter().map(move |item| InvoiceLineRecord {
                        sales_invoice: invoice.id,
                        invoice_item_row: item.id,
                        sales_invoice_date: invoice.posting_date,
                        item_code: item.item_code.clone(),
                        item_name: item.item_name.clone(),
                        description: item.description.clone(),
                        qty: item.qty,
                        rate: item.rate,
                        amount: item.amount,
                        uom: item.uom.clone(),
                        territory: item.territory.clone(),
                    })
                })
                .filter(|record| item_code.as_ref().map_or(true, |code| &record.item_code == code))
                .collect())
        }

        async fn submitted_invoice_taxes(
            &self,
            invoice: SalesInvoiceId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<SalesTaxCharge>, PortError> {
            Ok(self
                .invoices
                .read()
                .await
                .get(&invoice)
                .filter(|i| i.docstatus == DocStatus::Submitted)
                .map(|i| i.taxes.clone())
                .unwrap_or_default())
        }

        async fn returned_qty_by_status(
            &self,
            invoice: SalesInvoiceId,
            invoice_item: SalesInvoiceItemId,
            exclude_return: Option<SalesReturnId>,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<ReturnedQtyRow>, PortError> {
            let invoices = self.invoices.read().await;
            let mut sums: Vec<(DocStatus, Decimal)> = Vec::new();

            let returns = invoices.values().filter(|i| {
                i.is_return
                    && i.return_against == Some(invoice)
                    && !(exclude_return.is_some()
                        && i.combined_sales_return == exclude_return
                        && i.docstatus == DocStatus::Draft)
            });
            for credit_note in returns {
                for item in credit_note
                    .items
                    .iter()
                    .filter(|item| item.sales_invoice_item == Some(invoice_item))
                {
                    match sums.iter_mut().find(|(status, _)| *status == credit_note.docstatus) {
                        Some((_, qty)) => *qty += item.qty,
                        None => sums.push((credit_note.docstatus, item.qty)),
                    }
                }
            }

            Ok(sums
                .into_iter()
                .map(|(docstatus, qty)| ReturnedQtyRow { docstatus, qty: qty.abs() })
                .collect())
        }

        async fn persist_batch(
            &self,
            batch: DocumentBatch,
            _metadata: Option<OperationMetadata>,
        ) -> Result<BatchReceipt, PortError> {
            let mut invoices = self.invoices.write().await;
            let mut notes = self.delivery_notes.write().await;
            self.take_failure()?;
            Self::check_batch(&invoices, &notes, &batch)?;
            Ok(Self::store_batch(&mut invoices, &mut notes, batch))
        }
    }

    #[async_trait]
    impl ReturnDocumentPort for InMemoryErp {
        async fn get_return(
            &self,
            id: SalesReturnId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<CombinedSalesReturn, PortError> {
            self.returns
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Combined Sales Return", id))
        }

        async fn insert_return(
            &self,
            doc: CombinedSalesReturn,
            _metadata: Option<OperationMetadata>,
        ) -> Result<CombinedSalesReturn, PortError> {
            let mut returns = self.returns.write().await;
            if returns.contains_key(&doc.id) {
                return Err(PortError::conflict(format!("{} already exists", doc.name())));
            }
            returns.insert(doc.id, doc.clone());
            Ok(doc)
        }

        async fn update_return(
            &self,
            doc: CombinedSalesReturn,
            _metadata: Option<OperationMetadata>,
        ) -> Result<CombinedSalesReturn, PortError> {
            let mut returns = self.returns.write().await;
            match returns.get_mut(&doc.id) {
                Some(stored) => {
                    *stored = doc.clone();
                    Ok(doc)
                }
                None => Err(PortError::not_found("Combined Sales Return", doc.id)),
            }
        }

        async fn list_returns(
            &self,
            customer: CustomerId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<CombinedSalesReturn>, PortError> {
            let mut docs: Vec<_> = self
                .returns
                .read()
                .await
                .values()
                .filter(|d| d.customer == customer)
                .cloned()
                .collect();
            docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(docs)
        }

        async fn finalize_return(
            &self,
            doc: CombinedSalesReturn,
            batch: DocumentBatch,
            _metadata: Option<OperationMetadata>,
        ) -> Result<BatchReceipt, PortError> {
            let mut invoices = self.invoices.write().await;
            let mut notes = self.delivery_notes.write().await;
            let mut returns = self.returns.write().await;

            self.take_failure()?;
            if !returns.contains_key(&doc.id) {
                return Err(PortError::not_found("Combined Sales Return", doc.id));
            }
            Self::check_batch(&invoices, &notes, &batch)?;

            let receipt = Self::store_batch(&mut invoices, &mut notes, batch);
            returns.insert(doc.id, doc);
            Ok(receipt)
        }
    }
}
