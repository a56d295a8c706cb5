//! Test Data Builders
//!
//! Builders for ledger documents and return drafts. Tests name only the
//! fields they care about; everything else falls back to the fixtures.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{Currency, CustomerId, Money, SalesReturnId};
use domain_returns::{NewReturn, ReturnLine};
use domain_sales::{
    vat_rate, DeliveryNote, DeliveryNoteItem, SalesInvoice, SalesInvoiceItem, SalesTaxCharge,
    VAT_ACCOUNT_MARKER,
};

use crate::fixtures::{DateFixtures, PartyFixtures, TaxFixtures};

/// Builder for submitted (or draft) delivery notes
pub struct DeliveryNoteBuilder {
    customer: CustomerId,
    posting_date: NaiveDate,
    items: Vec<DeliveryNoteItem>,
}

impl DeliveryNoteBuilder {
    pub fn new(customer: CustomerId) -> Self {
        Self {
            customer,
            posting_date: DateFixtures::early_posting(),
            items: Vec::new(),
        }
    }

    pub fn posted_on(mut self, date: NaiveDate) -> Self {
        self.posting_date = date;
        self
    }

    /// Adds a shipped line out of `warehouse`
    pub fn item(mut self, item_code: &str, qty: Decimal, warehouse: &str) -> Self {
        self.items.push(
            DeliveryNoteItem::new(item_code, qty)
                .with_uom(Some("Nos".to_string()))
                .with_warehouse(Some(warehouse.to_string())),
        );
        self
    }

    /// Builds and submits the note
    pub fn build(self) -> DeliveryNote {
        let mut note = DeliveryNote::new(PartyFixtures::COMPANY, self.customer, self.posting_date);
        for item in self.items {
            note.add_item(item);
        }
        note.submit().expect("fixture delivery note must submit");
        note
    }
}

/// Builder for sales invoices
pub struct InvoiceBuilder {
    customer: CustomerId,
    posting_date: NaiveDate,
    currency: Currency,
    items: Vec<SalesInvoiceItem>,
    taxes: Vec<SalesTaxCharge>,
    submitted: bool,
}

impl InvoiceBuilder {
    /// Starts a submitted SAR invoice without lines or taxes
    pub fn new(customer: CustomerId) -> Self {
        Self {
            customer,
            posting_date: DateFixtures::late_posting(),
            currency: Currency::SAR,
            items: Vec::new(),
            taxes: Vec::new(),
            submitted: true,
        }
    }

    pub fn posted_on(mut self, date: NaiveDate) -> Self {
        self.posting_date = date;
        self
    }

    /// Adds a line billed without a delivery note
    pub fn line(mut self, item_code: &str, qty: Decimal, rate: Money) -> Self {
        self.items.push(
            SalesInvoiceItem::new(item_code, qty, rate)
                .with_item_name(item_code)
                .with_uom("Nos")
                .with_territory("Riyadh"),
        );
        self
    }

    /// Adds a line billing item `index` of a delivery note
    pub fn delivered_line(mut self, note: &DeliveryNote, index: usize, rate: Money) -> Self {
        let shipped = &note.items[index];
        let mut item = SalesInvoiceItem::new(shipped.item_code.clone(), shipped.qty, rate)
            .with_item_name(shipped.item_code.clone())
            .with_uom("Nos")
            .with_delivery(note.id, shipped.id);
        item.warehouse = shipped.warehouse.clone();
        self.items.push(item);
        self
    }

    pub fn with_tax(mut self, tax: SalesTaxCharge) -> Self {
        self.taxes.push(tax);
        self
    }

    /// Adds the 15% VAT row
    pub fn with_vat(self) -> Self {
        self.with_tax(TaxFixtures::vat_15())
    }

    /// Leaves the invoice as a draft
    pub fn draft(mut self) -> Self {
        self.submitted = false;
        self
    }

    pub fn build(self) -> SalesInvoice {
        let mut invoice = SalesInvoice::new(PartyFixtures::COMPANY, self.customer, self.posting_date, self.currency);
        for item in self.items {
            invoice.add_item(item);
        }
        for tax in self.taxes {
            invoice.add_tax(tax);
        }
        invoice
            .calculate_taxes_and_totals()
            .expect("fixture invoice totals must compute");
        if self.submitted {
            invoice.submit().expect("fixture invoice must submit");
        }
        invoice
    }
}

/// Builder for credit notes raised outside any combined return
pub struct CreditNoteBuilder<'a> {
    source: &'a SalesInvoice,
    lines: Vec<(usize, Decimal)>,
    submitted: bool,
    combined_sales_return: Option<SalesReturnId>,
}

impl<'a> CreditNoteBuilder<'a> {
    pub fn against(source: &'a SalesInvoice) -> Self {
        Self {
            source,
            lines: Vec::new(),
            submitted: true,
            combined_sales_return: None,
        }
    }

    /// Returns `qty` of the source invoice's item `index`
    pub fn line(mut self, index: usize, qty: Decimal) -> Self {
        self.lines.push((index, qty));
        self
    }

    pub fn draft(mut self) -> Self {
        self.submitted = false;
        self
    }

    /// Marks the note as generated by `id`
    pub fn from_return(mut self, id: SalesReturnId) -> Self {
        self.combined_sales_return = Some(id);
        self
    }

    pub fn build(self) -> SalesInvoice {
        let mut note = SalesInvoice::new_return_against(self.source, DateFixtures::late_posting());
        note.combined_sales_return = self.combined_sales_return;
        for (index, qty) in self.lines {
            let original = &self.source.items[index];
            note.add_item(
                SalesInvoiceItem::new(original.item_code.clone(), -qty.abs(), original.rate)
                    .with_sales_invoice_item(original.id),
            );
        }
        for tax in &self.source.taxes {
            note.add_tax(tax.copy_for_return(self.source.currency));
        }
        note.calculate_taxes_and_totals()
            .expect("fixture credit note totals must compute");
        if self.submitted {
            note.submit().expect("fixture credit note must submit");
        }
        note
    }
}

/// Creates a line returning `qty` of item `index` on `invoice`
///
/// Original quantity and VAT ratio are copied the way the invoice item
/// query would report them.
pub fn return_line(invoice: &SalesInvoice, index: usize, qty: Decimal) -> ReturnLine {
    let source = &invoice.items[index];
    let mut line = ReturnLine::new(source.item_code.clone(), qty, source.rate);
    line.linked_invoice = Some(invoice.id);
    line.sales_invoice_item = Some(source.id);
    line.item_name = source.item_name.clone();
    line.uom = source.uom.clone();
    line.territory = source.territory.clone();
    line.original_qty = source.qty;
    line.vat_rate_ratio = vat_rate(&invoice.taxes, VAT_ACCOUNT_MARKER).as_decimal();
    line
}

/// Builder for draft return input
pub struct ReturnBuilder {
    input: NewReturn,
}

impl ReturnBuilder {
    pub fn new(customer: CustomerId) -> Self {
        Self {
            input: NewReturn {
                company: PartyFixtures::COMPANY.to_string(),
                customer,
                posting_date: Some(DateFixtures::late_posting()),
                create_delivery_note: false,
                submit_credit_notes: true,
                lines: Vec::new(),
            },
        }
    }

    pub fn line(mut self, line: ReturnLine) -> Self {
        self.input.lines.push(line);
        self
    }

    /// Returns `qty` of item `index` on `invoice`
    pub fn returning(self, invoice: &SalesInvoice, index: usize, qty: Decimal) -> Self {
        self.line(return_line(invoice, index, qty))
    }

    pub fn with_delivery_note_returns(mut self) -> Self {
        self.input.create_delivery_note = true;
        self
    }

    /// Leaves generated credit notes as drafts
    pub fn draft_credit_notes(mut self) -> Self {
        self.input.submit_credit_notes = false;
        self
    }

    pub fn build(self) -> NewReturn {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::MoneyFixtures;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invoice_builder_computes_vat() {
        let invoice = InvoiceBuilder::new(PartyFixtures::customer())
            .line("WIDGET", dec!(10), MoneyFixtures::widget_rate())
            .with_vat()
            .build();

        assert!(invoice.is_submitted());
        assert_eq!(invoice.net_total.amount(), dec!(200));
        assert_eq!(invoice.grand_total.amount(), dec!(230));
    }

    #[test]
    fn test_delivered_line_carries_references() {
        let customer = PartyFixtures::customer();
        let note = DeliveryNoteBuilder::new(customer)
            .item("WIDGET", dec!(5), "Stores - AK")
            .build();
        let invoice = InvoiceBuilder::new(customer)
            .delivered_line(&note, 0, MoneyFixtures::widget_rate())
            .build();

        let item = &invoice.items[0];
        assert_eq!(item.delivery_note, Some(note.id));
        assert_eq!(item.dn_detail, Some(note.items[0].id));
        assert_eq!(item.warehouse.as_deref(), Some("Stores - AK"));
    }

    #[test]
    fn test_return_line_copies_invoice_figures() {
        let invoice = InvoiceBuilder::new(PartyFixtures::customer())
            .line("WIDGET", dec!(10), MoneyFixtures::widget_rate())
            .with_vat()
            .build();

        let line = return_line(&invoice, 0, dec!(-3));
        assert_eq!(line.qty, dec!(3));
        assert_eq!(line.original_qty, dec!(10));
        assert_eq!(line.vat_rate_ratio, dec!(0.15));
        assert!(line.is_linked());
    }

    #[test]
    fn test_credit_note_builder_negates_quantities() {
        let invoice = InvoiceBuilder::new(PartyFixtures::customer())
            .line("WIDGET", dec!(10), MoneyFixtures::widget_rate())
            .build();
        let note = CreditNoteBuilder::against(&invoice).line(0, dec!(4)).draft().build();

        assert!(note.is_return);
        assert!(!note.is_submitted());
        assert_eq!(note.items[0].qty, dec!(-4));
        assert_eq!(note.items[0].sales_invoice_item, Some(invoice.items[0].id));
    }
}
