//! Sales return service
//!
//! Entry point for every combined sales return operation. Drafts are
//! validated and totalled on every save; submission re-validates, builds
//! the credit notes and delivery note returns, and stores everything in
//! one batch.
//!
//! ```text
//!   Draft --submit--> Validating --ok--> Submitted
//!                         |
//!                         +--error--> Draft (nothing stored)
//! ```

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};

use core_kernel::{
    money_in_words, Currency, CustomerId, DeliveryNoteId, OperationMetadata, Rate, SalesInvoiceId,
    SalesReturnId,
};
use domain_sales::{vat_rate, DocumentBatch, InvoiceLineFilter, SalesLedgerPort, VAT_ACCOUNT_MARKER};

use crate::credit_note::{build_credit_notes, summarize, CreditNoteSummary};
use crate::delivery_return::{build_delivery_note_return, group_by_delivery_note};
use crate::document::{CombinedSalesReturn, ReturnLine};
use crate::error::ReturnError;
use crate::ledger::already_returned_qty;
use crate::ports::ReturnDocumentPort;
use crate::returnable::ReturnableInvoiceLine;
use crate::totals::calculate_totals;
use crate::validation::{validate_return_quantities, ReturnNotice};

/// Settings for the return service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSettings {
    /// Currency of new returns and of `amount_in_words`
    pub currency: Currency,
    /// Submit credit notes generated during submission even when the
    /// document does not ask for it
    pub submit_credit_notes_on_finalize: bool,
    /// Account-head marker of the VAT tax row
    pub vat_account_marker: String,
}

impl Default for ReturnSettings {
    fn default() -> Self {
        Self {
            currency: Currency::SAR,
            submit_credit_notes_on_finalize: false,
            vat_account_marker: VAT_ACCOUNT_MARKER.to_string(),
        }
    }
}

/// Input for a new draft return
#[derive(Debug, Clone)]
pub struct NewReturn {
    pub company: String,
    pub customer: CustomerId,
    /// Defaults to today
    pub posting_date: Option<NaiveDate>,
    pub create_delivery_note: bool,
    pub submit_credit_notes: bool,
    pub lines: Vec<ReturnLine>,
}

/// Changes to a draft return; absent fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ReturnChanges {
    pub create_delivery_note: Option<bool>,
    pub submit_credit_notes: Option<bool>,
    pub lines: Option<Vec<ReturnLine>>,
}

/// Parameters of the returnable invoice line query
#[derive(Debug, Clone, Default)]
pub struct InvoiceItemsQuery {
    pub customer: Option<CustomerId>,
    pub sales_invoice: Option<SalesInvoiceId>,
    pub select_all: bool,
    pub item_code: Option<String>,
}

/// A saved draft and the advisory notices raised while saving it
#[derive(Debug, Clone)]
pub struct SavedReturn {
    pub document: CombinedSalesReturn,
    pub notices: Vec<ReturnNotice>,
}

/// Result of a successful submission
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub document: CombinedSalesReturn,
    pub notices: Vec<ReturnNotice>,
    pub credit_notes: Vec<CreditNoteSummary>,
    pub delivery_note_returns: Vec<DeliveryNoteId>,
}

impl SubmissionOutcome {
    /// Newline-separated credit note report
    pub fn message(&self) -> String {
        summarize(&self.credit_notes)
    }
}

/// Combined sales return operations
pub struct SalesReturnService {
    sales: Arc<dyn SalesLedgerPort>,
    returns: Arc<dyn ReturnDocumentPort>,
    settings: ReturnSettings,
}

impl SalesReturnService {
    pub fn new(
        sales: Arc<dyn SalesLedgerPort>,
        returns: Arc<dyn ReturnDocumentPort>,
        settings: ReturnSettings,
    ) -> Self {
        Self {
            sales,
            returns,
            settings,
        }
    }

    pub fn settings(&self) -> &ReturnSettings {
        &self.settings
    }

    /// Creates a validated, totalled draft
    #[instrument(skip(self, input, metadata), fields(customer = %input.customer))]
    pub async fn create_return(
        &self,
        input: NewReturn,
        metadata: OperationMetadata,
    ) -> Result<SavedReturn, ReturnError> {
        metadata.require_caller()?;

        let posting_date = input.posting_date.unwrap_or_else(|| Utc::now().date_naive());
        let mut doc = CombinedSalesReturn::new(input.company, input.customer, posting_date, self.settings.currency);
        doc.create_delivery_note = input.create_delivery_note;
        doc.submit_credit_notes = input.submit_credit_notes;
        doc.replace_lines(input.lines);

        let notices = self.validate_and_total(&mut doc, &metadata).await?;
        let document = self.returns.insert_return(doc, Some(metadata)).await?;
        info!(sales_return = %document.id, lines = document.items.len(), "Created combined sales return");

        Ok(SavedReturn { document, notices })
    }

    /// Applies changes to a draft, then re-validates and re-totals it
    #[instrument(skip(self, changes, metadata))]
    pub async fn update_return(
        &self,
        id: SalesReturnId,
        changes: ReturnChanges,
        metadata: OperationMetadata,
    ) -> Result<SavedReturn, ReturnError> {
        metadata.require_caller()?;

        let mut doc = self.load(id, &metadata).await?;
        doc.ensure_editable()?;

        if let Some(flag) = changes.create_delivery_note {
            doc.create_delivery_note = flag;
        }
        if let Some(flag) = changes.submit_credit_notes {
            doc.submit_credit_notes = flag;
        }
        if let Some(lines) = changes.lines {
            doc.replace_lines(lines);
        }

        let notices = self.validate_and_total(&mut doc, &metadata).await?;
        let document = self.returns.update_return(doc, Some(metadata)).await?;

        Ok(SavedReturn { document, notices })
    }

    pub async fn get_return(
        &self,
        id: SalesReturnId,
        metadata: OperationMetadata,
    ) -> Result<CombinedSalesReturn, ReturnError> {
        metadata.require_caller()?;
        self.load(id, &metadata).await
    }

    pub async fn list_returns(
        &self,
        customer: CustomerId,
        metadata: OperationMetadata,
    ) -> Result<Vec<CombinedSalesReturn>, ReturnError> {
        metadata.require_caller()?;
        Ok(self.returns.list_returns(customer, Some(metadata)).await?)
    }

    /// Submits a draft
    ///
    /// Credit notes are generated for every invoice group; delivery note
    /// returns only when the document asks for them. The submitted return
    /// and all generated documents are stored together. On any failure the
    /// stored return stays in draft and the error is logged and returned.
    #[instrument(skip(self, metadata))]
    pub async fn submit_return(
        &self,
        id: SalesReturnId,
        metadata: OperationMetadata,
    ) -> Result<SubmissionOutcome, ReturnError> {
        metadata.require_caller()?;

        let mut doc = self.load(id, &metadata).await?;
        doc.ensure_editable()?;
        doc.begin_validation()?;

        match self.finalize(&mut doc, &metadata).await {
            Ok(outcome) => {
                info!(
                    sales_return = %id,
                    credit_notes = outcome.credit_notes.len(),
                    delivery_note_returns = outcome.delivery_note_returns.len(),
                    "Submitted combined sales return"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(sales_return = %id, error = %e, error_chain = ?e, "Combined sales return submission failed");
                doc.reject()?;
                Err(e)
            }
        }
    }

    async fn finalize(
        &self,
        doc: &mut CombinedSalesReturn,
        metadata: &OperationMetadata,
    ) -> Result<SubmissionOutcome, ReturnError> {
        let notices = self.validate_and_total(doc, metadata).await?;

        let today = Utc::now().date_naive();
        let submit_notes = doc.submit_credit_notes || self.settings.submit_credit_notes_on_finalize;
        let generated =
            build_credit_notes(self.sales.as_ref(), doc, today, submit_notes, Some(metadata.clone())).await?;

        let mut batch = DocumentBatch::new();
        let credit_notes: Vec<CreditNoteSummary> = generated.iter().map(|g| g.summary()).collect();
        batch.sales_invoices = generated.into_iter().map(|g| g.credit_note).collect();

        if doc.create_delivery_note {
            let groups = group_by_delivery_note(self.sales.as_ref(), &doc.items, Some(metadata.clone())).await?;
            for (delivery_note, lines) in groups {
                let built = build_delivery_note_return(
                    self.sales.as_ref(),
                    delivery_note,
                    &lines,
                    doc.id,
                    today,
                    Some(metadata.clone()),
                )
                .await?;
                if let Some(note) = built {
                    batch.delivery_notes.push(note);
                }
            }
        }

        let mut submitted = doc.clone();
        submitted.mark_submitted()?;
        let receipt = self
            .returns
            .finalize_return(submitted.clone(), batch, Some(metadata.clone()))
            .await?;
        *doc = submitted;

        Ok(SubmissionOutcome {
            document: doc.clone(),
            notices,
            credit_notes,
            delivery_note_returns: receipt.delivery_notes,
        })
    }

    /// Generates and stores credit notes for a return, whatever its status
    ///
    /// Returns one "Credit Note created for ..." line per note, joined
    /// with newlines.
    #[instrument(skip(self, metadata))]
    pub async fn create_credit_notes(
        &self,
        id: SalesReturnId,
        submit_credit_notes: bool,
        metadata: OperationMetadata,
    ) -> Result<String, ReturnError> {
        metadata.require_caller()?;

        let result = async {
            let doc = self.load(id, &metadata).await?;
            let generated = build_credit_notes(
                self.sales.as_ref(),
                &doc,
                Utc::now().date_naive(),
                submit_credit_notes,
                Some(metadata.clone()),
            )
            .await?;

            let summaries: Vec<CreditNoteSummary> = generated.iter().map(|g| g.summary()).collect();
            let batch = DocumentBatch {
                sales_invoices: generated.into_iter().map(|g| g.credit_note).collect(),
                delivery_notes: Vec::new(),
            };
            self.sales.persist_batch(batch, Some(metadata.clone())).await?;
            Ok::<_, ReturnError>(summarize(&summaries))
        }
        .await;

        if let Err(e) = &result {
            error!(sales_return = %id, error = %e, error_chain = ?e, "Credit note generation failed");
        }
        result
    }

    /// Lists invoice lines a customer may return, with VAT figures
    ///
    /// An item code searches every invoice of the customer, newest first;
    /// otherwise `select_all` lists every invoice of the customer; otherwise
    /// only the given invoice is listed, and nothing when none is given.
    #[instrument(skip(self, query, metadata))]
    pub async fn get_sales_invoice_items(
        &self,
        query: InvoiceItemsQuery,
        metadata: OperationMetadata,
    ) -> Result<Vec<ReturnableInvoiceLine>, ReturnError> {
        metadata.require_caller()?;
        let customer = query.customer.ok_or(ReturnError::CustomerRequired)?;

        let item_code = query.item_code.filter(|code| !code.trim().is_empty());
        let filter = if item_code.is_some() || query.select_all {
            InvoiceLineFilter::Customer { customer, item_code }
        } else {
            match query.sales_invoice {
                Some(invoice) => InvoiceLineFilter::Invoice(invoice),
                None => return Ok(Vec::new()),
            }
        };

        let records = self.sales.find_invoice_lines(filter, Some(metadata.clone())).await?;

        let mut vat_cache: HashMap<SalesInvoiceId, Rate> = HashMap::new();
        let mut lines = Vec::with_capacity(records.len());
        for record in records {
            let rate = match vat_cache.get(&record.sales_invoice) {
                Some(rate) => *rate,
                None => {
                    let taxes = self
                        .sales
                        .submitted_invoice_taxes(record.sales_invoice, Some(metadata.clone()))
                        .await?;
                    let rate = vat_rate(&taxes, &self.settings.vat_account_marker);
                    vat_cache.insert(record.sales_invoice, rate);
                    rate
                }
            };
            let invoice = record.sales_invoice;
            let invoice_item = record.invoice_item_row;
            let mut line = ReturnableInvoiceLine::from_record(record, rate);
            line.already_returned_qty =
                already_returned_qty(self.sales.as_ref(), invoice, invoice_item, Some(metadata.clone())).await?;
            lines.push(line);
        }

        Ok(lines)
    }

    /// Spells out `abs(amount)` in the configured currency
    pub fn amount_in_words(
        &self,
        amount: Decimal,
        metadata: &OperationMetadata,
    ) -> Result<String, ReturnError> {
        metadata.require_caller()?;
        Ok(money_in_words(amount, self.settings.currency)?)
    }

    async fn load(
        &self,
        id: SalesReturnId,
        metadata: &OperationMetadata,
    ) -> Result<CombinedSalesReturn, ReturnError> {
        self.returns
            .get_return(id, Some(metadata.clone()))
            .await
            .map_err(|e| match e {
                core_kernel::PortError::NotFound { .. } => ReturnError::NotFound(id.to_string()),
                other => ReturnError::Port(other),
            })
    }

    async fn validate_and_total(
        &self,
        doc: &mut CombinedSalesReturn,
        metadata: &OperationMetadata,
    ) -> Result<Vec<ReturnNotice>, ReturnError> {
        let notices = validate_return_quantities(self.sales.as_ref(), doc, Some(metadata.clone())).await?;
        calculate_totals(doc)?;
        Ok(notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::InMemoryErp;
    use core_kernel::{Money, PortError};
    use domain_sales::{ChargeType, SalesInvoice, SalesInvoiceItem, SalesTaxCharge};
    use rust_decimal_macros::dec;

    fn caller() -> OperationMetadata {
        OperationMetadata::for_caller("accounts@example.com")
    }

    async fn seeded() -> (Arc<InMemoryErp>, SalesReturnService, SalesInvoice) {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut invoice = SalesInvoice::new("Acme KSA", CustomerId::new_v7(), date, Currency::SAR);
        invoice.add_item(SalesInvoiceItem::new("WIDGET", dec!(10), Money::new(dec!(20), Currency::SAR)));
        invoice.add_tax(SalesTaxCharge::new(ChargeType::OnNetTotal, "VAT 15% - AK", dec!(15), Currency::SAR));
        invoice.calculate_taxes_and_totals().unwrap();
        invoice.submit().unwrap();

        let erp = Arc::new(InMemoryErp::new());
        erp.insert_invoice(invoice.clone()).await;
        let service = SalesReturnService::new(erp.clone(), erp.clone(), ReturnSettings::default());
        (erp, service, invoice)
    }

    #[tokio::test]
    async fn test_operations_require_caller() {
        let (_, service, _) = seeded().await;
        let result = service.amount_in_words(dec!(1), &OperationMetadata::default());
        assert!(matches!(result, Err(ReturnError::Port(PortError::Unauthorized { .. }))));
    }

    #[tokio::test]
    async fn test_missing_customer_is_rejected() {
        let (_, service, _) = seeded().await;
        let result = service
            .get_sales_invoice_items(InvoiceItemsQuery::default(), caller())
            .await;
        assert!(matches!(result, Err(ReturnError::CustomerRequired)));
    }

    #[tokio::test]
    async fn test_no_invoice_selected_returns_nothing() {
        let (_, service, invoice) = seeded().await;
        let query = InvoiceItemsQuery {
            customer: Some(invoice.customer),
            ..Default::default()
        };
        assert!(service.get_sales_invoice_items(query, caller()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoice_lines_carry_vat() {
        let (_, service, invoice) = seeded().await;
        let query = InvoiceItemsQuery {
            customer: Some(invoice.customer),
            sales_invoice: Some(invoice.id),
            ..Default::default()
        };
        let lines = service.get_sales_invoice_items(query, caller()).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].vat_rate_ratio, dec!(0.15));
        assert_eq!(lines[0].vat_amount.amount(), dec!(30));
        assert_eq!(lines[0].max_returnable_qty, dec!(10));
        assert_eq!(lines[0].already_returned_qty, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_invoice_lines_report_submitted_returns_only() {
        let (erp, service, invoice) = seeded().await;
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        for (qty, submit) in [(dec!(4), true), (dec!(3), false)] {
            let mut note = SalesInvoice::new_return_against(&invoice, date);
            note.add_item(
                SalesInvoiceItem::new("WIDGET", -qty, Money::new(dec!(20), Currency::SAR))
                    .with_sales_invoice_item(invoice.items[0].id),
            );
            note.calculate_taxes_and_totals().unwrap();
            if submit {
                note.submit().unwrap();
            }
            erp.insert_invoice(note).await;
        }

        let query = InvoiceItemsQuery {
            customer: Some(invoice.customer),
            sales_invoice: Some(invoice.id),
            ..Default::default()
        };
        let lines = service.get_sales_invoice_items(query, caller()).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].already_returned_qty, dec!(4));

        let line = ReturnLine::from_invoice_line(&lines[0], dec!(2));
        assert_eq!(line.already_returned_qty, dec!(4));
    }

    #[tokio::test]
    async fn test_unknown_return_is_not_found() {
        let (_, service, _) = seeded().await;
        let result = service.get_return(SalesReturnId::new_v7(), caller()).await;
        assert!(matches!(result, Err(ReturnError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_amount_in_words_uses_absolute_value() {
        let (_, service, _) = seeded().await;
        assert_eq!(
            service.amount_in_words(dec!(-230), &caller()).unwrap(),
            "SAR Two Hundred And Thirty only."
        );
    }
}
