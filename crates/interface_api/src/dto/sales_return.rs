//! Combined sales return DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use core_kernel::{Currency, CustomerId, Money, SalesInvoiceId, SalesInvoiceItemId};
use domain_returns::{
    CombinedSalesReturn, CreditNoteSummary, NewReturn, ReturnChanges, ReturnLine, ReturnNotice,
    SavedReturn, SubmissionOutcome,
};

fn non_zero(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::new("non_zero"));
    }
    Ok(())
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReturnRequest {
    #[validate(length(min = 1))]
    pub company: String,
    pub customer: Uuid,
    pub posting_date: Option<NaiveDate>,
    #[serde(default)]
    pub create_delivery_note: bool,
    #[serde(default)]
    pub submit_credit_notes: bool,
    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<ReturnLineRequest>,
}

impl CreateReturnRequest {
    pub fn into_new_return(self, currency: Currency) -> NewReturn {
        NewReturn {
            company: self.company,
            customer: CustomerId::from_uuid(self.customer),
            posting_date: self.posting_date,
            create_delivery_note: self.create_delivery_note,
            submit_credit_notes: self.submit_credit_notes,
            lines: self.items.into_iter().map(|l| l.into_line(currency)).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReturnRequest {
    pub create_delivery_note: Option<bool>,
    pub submit_credit_notes: Option<bool>,
    #[validate(nested)]
    pub items: Option<Vec<ReturnLineRequest>>,
}

impl UpdateReturnRequest {
    pub fn into_changes(self, currency: Currency) -> ReturnChanges {
        ReturnChanges {
            create_delivery_note: self.create_delivery_note,
            submit_credit_notes: self.submit_credit_notes,
            lines: self
                .items
                .map(|items| items.into_iter().map(|l| l.into_line(currency)).collect()),
        }
    }
}

/// One line to return, usually copied from `GET /sales-invoice-items`
#[derive(Debug, Deserialize, Validate)]
pub struct ReturnLineRequest {
    pub sales_invoice: Option<Uuid>,
    pub sales_invoice_item: Option<Uuid>,
    #[validate(length(min = 1))]
    pub item_code: String,
    pub item_name: Option<String>,
    pub uom: Option<String>,
    pub territory: Option<String>,
    #[serde(default)]
    pub original_qty: Decimal,
    #[validate(custom(function = "non_zero"))]
    pub qty: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub rate: Decimal,
    #[serde(default)]
    pub vat_rate_ratio: Decimal,
}

impl ReturnLineRequest {
    pub fn into_line(self, currency: Currency) -> ReturnLine {
        let mut line = ReturnLine::new(self.item_code, self.qty, Money::new(self.rate, currency));
        line.linked_invoice = self.sales_invoice.map(SalesInvoiceId::from_uuid);
        line.sales_invoice_item = self.sales_invoice_item.map(SalesInvoiceItemId::from_uuid);
        line.item_name = self.item_name;
        line.uom = self.uom;
        line.territory = self.territory;
        line.original_qty = self.original_qty;
        line.vat_rate_ratio = self.vat_rate_ratio;
        line
    }
}

/// Query string of `POST /sales-returns/:id/credit-notes`
#[derive(Debug, Default, Deserialize)]
pub struct CreditNotesParams {
    #[serde(default)]
    pub submit_credit_notes: bool,
}

/// Query string of `GET /sales-returns`
#[derive(Debug, Deserialize)]
pub struct ListReturnsParams {
    pub customer: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ReturnLineResponse {
    pub idx: u32,
    pub sales_invoice: Option<Uuid>,
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

impl From<&ReturnLine> for ReturnLineResponse {
    fn from(line: &ReturnLine) -> Self {
        Self {
            idx: line.idx,
            sales_invoice: line.linked_invoice.map(|id| *id.as_uuid()),
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
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub customer: Uuid,
    pub posting_date: NaiveDate,
    pub currency: String,
    pub status: String,
    pub create_delivery_note: bool,
    pub submit_credit_notes: bool,
    pub items: Vec<ReturnLineResponse>,
    pub total_qty: Decimal,
    pub total: Decimal,
    pub total_taxes: Decimal,
    pub grand_total: Decimal,
    pub in_words: String,
    /// Draft overlap notices raised while validating
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReturnResponse {
    pub fn new(doc: &CombinedSalesReturn, notices: &[ReturnNotice]) -> Self {
        Self {
            id: *doc.id.as_uuid(),
            name: doc.name(),
            company: doc.company.clone(),
            customer: *doc.customer.as_uuid(),
            posting_date: doc.posting_date,
            currency: doc.currency.code().to_string(),
            status: doc.status.to_string(),
            create_delivery_note: doc.create_delivery_note,
            submit_credit_notes: doc.submit_credit_notes,
            items: doc.items.iter().map(ReturnLineResponse::from).collect(),
            total_qty: doc.total_qty,
            total: doc.total.amount(),
            total_taxes: doc.total_taxes.amount(),
            grand_total: doc.grand_total.amount(),
            in_words: doc.in_words.clone(),
            notices: notices.iter().map(ToString::to_string).collect(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<SavedReturn> for ReturnResponse {
    fn from(saved: SavedReturn) -> Self {
        Self::new(&saved.document, &saved.notices)
    }
}

impl From<CombinedSalesReturn> for ReturnResponse {
    fn from(doc: CombinedSalesReturn) -> Self {
        Self::new(&doc, &[])
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    /// Newline-separated credit note report
    pub message: String,
    pub document: ReturnResponse,
    pub credit_notes: Vec<CreditNoteSummary>,
    pub delivery_note_returns: Vec<String>,
}

impl From<SubmissionOutcome> for SubmissionResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            message: outcome.message(),
            document: ReturnResponse::new(&outcome.document, &outcome.notices),
            delivery_note_returns: outcome.delivery_note_returns.iter().map(ToString::to_string).collect(),
            credit_notes: outcome.credit_notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line_request(qty: Decimal, rate: Decimal) -> ReturnLineRequest {
        ReturnLineRequest {
            sales_invoice: Some(Uuid::now_v7()),
            sales_invoice_item: Some(Uuid::now_v7()),
            item_code: "WIDGET".to_string(),
            item_name: None,
            uom: Some("Nos".to_string()),
            territory: None,
            original_qty: dec!(10),
            qty,
            rate,
            vat_rate_ratio: dec!(0.15),
        }
    }

    #[test]
    fn test_line_request_validation() {
        assert!(line_request(dec!(2), dec!(20)).validate().is_ok());
        assert!(line_request(dec!(0), dec!(20)).validate().is_err());
        assert!(line_request(dec!(2), dec!(-1)).validate().is_err());
    }

    #[test]
    fn test_line_request_keeps_links_and_stores_absolute_qty() {
        let request = line_request(dec!(-3), dec!(20));
        let invoice = request.sales_invoice;
        let line = request.into_line(Currency::SAR);

        assert_eq!(line.linked_invoice.map(|id| *id.as_uuid()), invoice);
        assert_eq!(line.qty, dec!(3));
        assert_eq!(line.vat_rate_ratio, dec!(0.15));
        assert!(line.is_linked());
    }
}
