//! Combined sales return aggregate

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{
    Currency, CustomerId, Money, ReturnLineId, SalesInvoiceId, SalesInvoiceItemId, SalesReturnId,
};
use crate::error::ReturnError;
use crate::returnable::ReturnableInvoiceLine;

/// Lifecycle status of a combined sales return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    /// Editable
    Draft,
    /// Submission in progress, quantities being re-checked
    Validating,
    /// Credit notes generated, immutable
    Submitted,
}

impl ReturnStatus {
    /// Checks if transition is valid
    pub fn can_transition_to(&self, target: ReturnStatus) -> bool {
        use ReturnStatus::*;
        matches!(
            (*self, target),
            (Draft, Validating) |
            (Validating, Draft) |
            (Validating, Submitted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Draft => "draft",
            ReturnStatus::Validating => "validating",
            ReturnStatus::Submitted => "submitted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(ReturnStatus::Draft),
            "validating" => Some(ReturnStatus::Validating),
            "submitted" => Some(ReturnStatus::Submitted),
            _ => None,
        }
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One returned item line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnLine {
    pub id: ReturnLineId,
    /// 1-based position on the document
    pub idx: u32,
    /// Invoice the goods were billed on
    pub linked_invoice: Option<SalesInvoiceId>,
    /// Invoice line the goods were billed on
    pub sales_invoice_item: Option<SalesInvoiceItemId>,
    pub item_code: String,
    pub item_name: Option<String>,
    pub uom: Option<String>,
    pub territory: Option<String>,
    /// Quantity on the source invoice line
    pub original_qty: Decimal,
    /// Quantity being returned, stored non-negative
    pub qty: Decimal,
    pub rate: Money,
    /// `qty * rate`
    pub total_amount: Money,
    /// VAT rate of the source invoice as a ratio (0.15 for 15%)
    pub vat_rate_ratio: Decimal,
    pub vat_amount: Money,
    /// Quantity returned by submitted credit notes, refreshed on validation
    pub already_returned_qty: Decimal,
    /// Quantity held by draft credit notes, refreshed on validation
    pub draft_returned_qty: Decimal,
}

impl ReturnLine {
    /// Creates a free-form line not tied to any invoice
    pub fn new(item_code: impl Into<String>, qty: Decimal, rate: Money) -> Self {
        let currency = rate.currency();
        Self {
            id: ReturnLineId::new_v7(),
            idx: 0,
            linked_invoice: None,
            sales_invoice_item: None,
            item_code: item_code.into(),
            item_name: None,
            uom: None,
            territory: None,
            original_qty: Decimal::ZERO,
            qty: qty.abs(),
            rate,
            total_amount: Money::zero(currency),
            vat_rate_ratio: Decimal::ZERO,
            vat_amount: Money::zero(currency),
            already_returned_qty: Decimal::ZERO,
            draft_returned_qty: Decimal::ZERO,
        }
    }

    /// Creates a line returning `qty` of a returnable invoice line
    pub fn from_invoice_line(source: &ReturnableInvoiceLine, qty: Decimal) -> Self {
        let mut line = Self::new(source.item_code.clone(), qty, source.rate);
        line.linked_invoice = Some(source.sales_invoice);
        line.sales_invoice_item = Some(source.invoice_item_row);
        line.item_name = source.item_name.clone();
        line.uom = source.uom.clone();
        line.territory = source.territory.clone();
        line.original_qty = source.original_qty;
        line.vat_rate_ratio = source.vat_rate_ratio;
        line.already_returned_qty = source.already_returned_qty;
        line
    }

    /// True when the line points at both an invoice and an invoice line
    pub fn is_linked(&self) -> bool {
        self.linked_invoice.is_some() && self.sales_invoice_item.is_some()
    }

    /// Quantity as it appears on a credit note
    pub fn credit_note_qty(&self) -> Decimal {
        -self.qty.abs()
    }
}

/// A return spanning one or more sales invoices of a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedSalesReturn {
    pub id: SalesReturnId,
    pub company: String,
    pub customer: CustomerId,
    pub posting_date: NaiveDate,
    pub currency: Currency,
    pub status: ReturnStatus,
    /// Also reverse the stock movement through delivery note returns
    pub create_delivery_note: bool,
    /// Submit generated credit notes instead of leaving them as drafts
    pub submit_credit_notes: bool,
    pub items: Vec<ReturnLine>,
    pub total_qty: Decimal,
    pub total: Money,
    pub total_taxes: Money,
    pub grand_total: Money,
    /// Grand total spelled out
    pub in_words: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CombinedSalesReturn {
    /// Creates an empty draft
    pub fn new(
        company: impl Into<String>,
        customer: CustomerId,
        posting_date: NaiveDate,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SalesReturnId::new_v7(),
            company: company.into(),
            customer,
            posting_date,
            currency,
            status: ReturnStatus::Draft,
            create_delivery_note: false,
            submit_credit_notes: false,
            items: Vec::new(),
            total_qty: Decimal::ZERO,
            total: Money::zero(currency),
            total_taxes: Money::zero(currency),
            grand_total: Money::zero(currency),
            in_words: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> String {
        self.id.to_string()
    }

    /// Appends a line, assigning its position
    pub fn add_line(&mut self, mut line: ReturnLine) {
        line.idx = self.items.len() as u32 + 1;
        self.items.push(line);
        self.updated_at = Utc::now();
    }

    /// Replaces every line, renumbering from 1
    pub fn replace_lines(&mut self, lines: Vec<ReturnLine>) {
        self.items.clear();
        for line in lines {
            self.add_line(line);
        }
    }

    /// Fails unless the document can still be edited
    pub fn ensure_editable(&self) -> Result<(), ReturnError> {
        if self.status != ReturnStatus::Draft {
            return Err(ReturnError::InvalidStateTransition {
                from: self.status.to_string(),
                to: ReturnStatus::Draft.to_string(),
            });
        }
        Ok(())
    }

    /// Draft -> Validating
    pub fn begin_validation(&mut self) -> Result<(), ReturnError> {
        self.transition(ReturnStatus::Validating)
    }

    /// Validating -> Draft after a failed submission
    pub fn reject(&mut self) -> Result<(), ReturnError> {
        self.transition(ReturnStatus::Draft)
    }

    /// Validating -> Submitted
    pub fn mark_submitted(&mut self) -> Result<(), ReturnError> {
        self.transition(ReturnStatus::Submitted)
    }

    fn transition(&mut self, target: ReturnStatus) -> Result<(), ReturnError> {
        if !self.status.can_transition_to(target) {
            return Err(ReturnError::InvalidStateTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}
