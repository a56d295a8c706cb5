//! Sales invoice aggregate
//!
//! Covers both regular invoices and return invoices (credit notes). A
//! return invoice carries `is_return`, points back at the invoice it
//! reverses through `return_against`, and holds negative item quantities.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, CustomerId, Money, SalesInvoiceId, SalesInvoiceItemId, SalesReturnId, DeliveryNoteId, DeliveryNoteItemId};
use crate::error::SalesError;
use crate::status::DocStatus;
use crate::taxes::{apply_schedule, inclusive_ratio, SalesTaxCharge};

/// A sales invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesInvoice {
    /// Unique identifier
    pub id: SalesInvoiceId,
    pub company: String,
    pub customer: CustomerId,
    pub posting_date: NaiveDate,
    pub currency: Currency,
    pub docstatus: DocStatus,
    /// True for credit notes
    pub is_return: bool,
    /// Invoice reversed by this credit note
    pub return_against: Option<SalesInvoiceId>,
    /// Name of the tax template the schedule was built from
    pub taxes_and_charges: Option<String>,
    /// Whether the credit note books against its own outstanding amount
    pub update_outstanding_for_self: bool,
    /// Combined sales return that generated this document
    pub combined_sales_return: Option<SalesReturnId>,
    pub items: Vec<SalesInvoiceItem>,
    pub taxes: Vec<SalesTaxCharge>,
    pub net_total: Money,
    pub total_taxes_and_charges: Money,
    pub grand_total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalesInvoice {
    /// Creates an empty draft invoice
    pub fn new(
        company: impl Into<String>,
        customer: CustomerId,
        posting_date: NaiveDate,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SalesInvoiceId::new_v7(),
            company: company.into(),
            customer,
            posting_date,
            currency,
            docstatus: DocStatus::Draft,
            is_return: false,
            return_against: None,
            taxes_and_charges: None,
            update_outstanding_for_self: true,
            combined_sales_return: None,
            items: Vec::new(),
            taxes: Vec::new(),
            net_total: Money::zero(currency),
            total_taxes_and_charges: Money::zero(currency),
            grand_total: Money::zero(currency),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a draft credit note reversing `original`
    ///
    /// Company, customer, currency and tax template are copied; the credit
    /// note does not update its own outstanding amount.
    pub fn new_return_against(original: &SalesInvoice, posting_date: NaiveDate) -> Self {
        let mut credit_note = Self::new(
            original.company.clone(),
            original.customer,
            posting_date,
            original.currency,
        );
        credit_note.is_return = true;
        credit_note.return_against = Some(original.id);
        credit_note.taxes_and_charges = original.taxes_and_charges.clone();
        credit_note.update_outstanding_for_self = false;
        credit_note
    }

    /// Document name as shown to users
    pub fn name(&self) -> String {
        self.id.to_string()
    }

    pub fn is_submitted(&self) -> bool {
        self.docstatus == DocStatus::Submitted
    }

    /// Appends an item line, assigning its parent and position
    pub fn add_item(&mut self, mut item: SalesInvoiceItem) {
        item.parent = self.id;
        item.idx = self.items.len() as u32 + 1;
        self.items.push(item);
        self.updated_at = Utc::now();
    }

    /// Appends a tax row, assigning its position
    pub fn add_tax(&mut self, mut tax: SalesTaxCharge) {
        tax.idx = self.taxes.len() as u32 + 1;
        self.taxes.push(tax);
        self.updated_at = Utc::now();
    }

    /// Recomputes item amounts, the tax schedule and document totals
    ///
    /// Rates of charges included in the print rate are treated as gross:
    /// the net amount of each item is backed out before taxes are applied.
    pub fn calculate_taxes_and_totals(&mut self) -> Result<(), SalesError> {
        let currency = self.currency;
        let inclusive = inclusive_ratio(&self.taxes)?;

        for item in &mut self.items {
            let amount = Money::new(item.qty * item.rate.amount(), currency).round_to_currency();
            item.amount = amount;
            item.net_amount = if inclusive.is_zero() {
                amount
            } else {
                Money::new(amount.amount() / (dec!(1) + inclusive), currency).round_to_currency()
            };
        }

        let net_total = Money::sum(currency, self.items.iter().map(|i| &i.net_amount))?;
        let total_taxes = apply_schedule(&mut self.taxes, net_total)?;

        self.net_total = net_total;
        self.total_taxes_and_charges = total_taxes;
        self.grand_total = net_total.checked_add(&total_taxes)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Finalizes the invoice
    pub fn submit(&mut self) -> Result<(), SalesError> {
        if self.items.is_empty() {
            return Err(SalesError::EmptyDocument(self.name()));
        }
        self.transition(DocStatus::Submitted)
    }

    /// Reverses a submitted invoice
    pub fn cancel(&mut self) -> Result<(), SalesError> {
        self.transition(DocStatus::Cancelled)
    }

    fn transition(&mut self, target: DocStatus) -> Result<(), SalesError> {
        let allowed = matches!(
            (self.docstatus, target),
            (DocStatus::Draft, DocStatus::Submitted) | (DocStatus::Submitted, DocStatus::Cancelled)
        );
        if !allowed {
            return Err(SalesError::InvalidStatusTransition {
                from: self.docstatus.to_string(),
                to: target.to_string(),
            });
        }
        self.docstatus = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// An item line on a sales invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesInvoiceItem {
    pub id: SalesInvoiceItemId,
    /// Owning invoice
    pub parent: SalesInvoiceId,
    /// 1-based position on the invoice
    pub idx: u32,
    pub item_code: String,
    pub item_name: Option<String>,
    pub description: Option<String>,
    /// Quantity, negative on credit notes
    pub qty: Decimal,
    pub rate: Money,
    pub amount: Money,
    /// Amount net of print-rate-inclusive taxes
    pub net_amount: Money,
    pub uom: Option<String>,
    pub territory: Option<String>,
    pub warehouse: Option<String>,
    /// Delivery note the goods left on
    pub delivery_note: Option<DeliveryNoteId>,
    /// Delivery note line the goods left on
    pub dn_detail: Option<DeliveryNoteItemId>,
    /// Originating invoice line, set on credit note items
    pub sales_invoice_item: Option<SalesInvoiceItemId>,
}

impl SalesInvoiceItem {
    /// Creates an item line; the amount is filled in by
    /// [`SalesInvoice::calculate_taxes_and_totals`]
    pub fn new(item_code: impl Into<String>, qty: Decimal, rate: Money) -> Self {
        let currency = rate.currency();
        Self {
            id: SalesInvoiceItemId::new_v7(),
            parent: SalesInvoiceId::from_uuid(uuid::Uuid::nil()),
            idx: 0,
            item_code: item_code.into(),
            item_name: None,
            description: None,
            qty,
            rate,
            amount: Money::new(qty * rate.amount(), currency).round_to_currency(),
            net_amount: Money::zero(currency),
            uom: None,
            territory: None,
            warehouse: None,
            delivery_note: None,
            dn_detail: None,
            sales_invoice_item: None,
        }
    }

    pub fn with_item_name(mut self, item_name: impl Into<String>) -> Self {
        self.item_name = Some(item_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_uom(mut self, uom: impl Into<String>) -> Self {
        self.uom = Some(uom.into());
        self
    }

    pub fn with_territory(mut self, territory: impl Into<String>) -> Self {
        self.territory = Some(territory.into());
        self
    }

    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    /// Links the line to the delivery note line it was shipped on
    pub fn with_delivery(mut self, delivery_note: DeliveryNoteId, dn_detail: DeliveryNoteItemId) -> Self {
        self.delivery_note = Some(delivery_note);
        self.dn_detail = Some(dn_detail);
        self
    }

    pub fn with_sales_invoice_item(mut self, item: SalesInvoiceItemId) -> Self {
        self.sales_invoice_item = Some(item);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxes::ChargeType;

    fn sar(amount: Decimal) -> Money {
        Money::new(amount, Currency::SAR)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn invoice_with_vat() -> SalesInvoice {
        let mut invoice = SalesInvoice::new("Acme KSA", CustomerId::new_v7(), date(), Currency::SAR);
        invoice.add_item(SalesInvoiceItem::new("ITEM-A", dec!(10), sar(dec!(20))));
        invoice.add_item(SalesInvoiceItem::new("ITEM-B", dec!(2), sar(dec!(50))));
        invoice.add_tax(SalesTaxCharge::new(ChargeType::OnNetTotal, "VAT 15% - AK", dec!(15), Currency::SAR));
        invoice
    }

    #[test]
    fn test_calculate_taxes_and_totals() {
        let mut invoice = invoice_with_vat();
        invoice.calculate_taxes_and_totals().unwrap();

        assert_eq!(invoice.net_total.amount(), dec!(300));
        assert_eq!(invoice.total_taxes_and_charges.amount(), dec!(45));
        assert_eq!(invoice.grand_total.amount(), dec!(345));
        assert_eq!(invoice.items[1].idx, 2);
        assert_eq!(invoice.items[1].parent, invoice.id);
    }

    #[test]
    fn test_inclusive_tax_backs_out_net_amount() {
        let mut invoice = SalesInvoice::new("Acme KSA", CustomerId::new_v7(), date(), Currency::SAR);
        invoice.add_item(SalesInvoiceItem::new("ITEM-A", dec!(1), sar(dec!(115))));
        invoice.add_tax(
            SalesTaxCharge::new(ChargeType::OnNetTotal, "VAT 15% - AK", dec!(15), Currency::SAR)
                .included_in_print_rate(),
        );

        invoice.calculate_taxes_and_totals().unwrap();
        assert_eq!(invoice.net_total.amount(), dec!(100));
        assert_eq!(invoice.grand_total.amount(), dec!(115));
    }

    #[test]
    fn test_return_against_copies_header() {
        let mut original = invoice_with_vat();
        original.taxes_and_charges = Some("KSA VAT 15%".to_string());

        let credit_note = SalesInvoice::new_return_against(&original, date());
        assert!(credit_note.is_return);
        assert_eq!(credit_note.return_against, Some(original.id));
        assert_eq!(credit_note.customer, original.customer);
        assert_eq!(credit_note.taxes_and_charges.as_deref(), Some("KSA VAT 15%"));
        assert!(!credit_note.update_outstanding_for_self);
        assert!(credit_note.items.is_empty());
    }

    #[test]
    fn test_negative_quantities_give_negative_totals() {
        let original = invoice_with_vat();
        let mut credit_note = SalesInvoice::new_return_against(&original, date());
        credit_note.add_item(SalesInvoiceItem::new("ITEM-A", dec!(-3), sar(dec!(20))));
        credit_note.add_tax(original.taxes[0].copy_for_return(Currency::SAR));

        credit_note.calculate_taxes_and_totals().unwrap();
        assert_eq!(credit_note.net_total.amount(), dec!(-60));
        assert_eq!(credit_note.grand_total.amount(), dec!(-69));
    }

    #[test]
    fn test_status_transitions() {
        let mut invoice = invoice_with_vat();
        assert!(invoice.cancel().is_err());
        invoice.submit().unwrap();
        assert!(invoice.is_submitted());
        assert!(invoice.submit().is_err());
        invoice.cancel().unwrap();
        assert_eq!(invoice.docstatus, DocStatus::Cancelled);
    }

    #[test]
    fn test_submit_rejects_empty_invoice() {
        let mut invoice = SalesInvoice::new("Acme KSA", CustomerId::new_v7(), date(), Currency::SAR);
        assert!(matches!(invoice.submit(), Err(SalesError::EmptyDocument(_))));
    }
}
