//! Returnable invoice line DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{CustomerId, SalesInvoiceId};
use domain_returns::{InvoiceItemsQuery, ReturnableInvoiceLine};

/// Query string of `GET /sales-invoice-items`
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceItemsParams {
    pub customer: Option<Uuid>,
    pub sales_invoice: Option<Uuid>,
    #[serde(default)]
    pub select_all: bool,
    pub item_code: Option<String>,
}

impl From<InvoiceItemsParams> for InvoiceItemsQuery {
    fn from(params: InvoiceItemsParams) -> Self {
        InvoiceItemsQuery {
            customer: params.customer.map(CustomerId::from_uuid),
            sales_invoice: params.sales_invoice.map(SalesInvoiceId::from_uuid),
            select_all: params.select_all,
            item_code: params.item_code,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceItemResponse {
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
    pub vat_rate_ratio: Decimal,
    pub vat_amount: Decimal,
    pub original_qty: Decimal,
    pub max_returnable_qty: Decimal,
    pub already_returned_qty: Decimal,
}

impl From<ReturnableInvoiceLine> for InvoiceItemResponse {
    fn from(line: ReturnableInvoiceLine) -> Self {
        Self {
            sales_invoice: *line.sales_invoice.as_uuid(),
            invoice_item_row: *line.invoice_item_row.as_uuid(),
            sales_invoice_date: line.sales_invoice_date,
            item_code: line.item_code,
            item_name: line.item_name,
            description: line.description,
            qty: line.qty,
            rate: line.rate.amount(),
            amount: line.amount.amount(),
            uom: line.uom,
            territory: line.territory,
            vat_rate_ratio: line.vat_rate_ratio,
            vat_amount: line.vat_amount.amount(),
            original_qty: line.original_qty,
            max_returnable_qty: line.max_returnable_qty,
            already_returned_qty: line.already_returned_qty,
        }
    }
}

/// Query string of `GET /amount-in-words`
#[derive(Debug, Deserialize)]
pub struct AmountInWordsParams {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AmountInWordsResponse {
    pub amount: Decimal,
    pub in_words: String,
}
