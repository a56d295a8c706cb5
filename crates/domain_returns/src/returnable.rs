//! Returnable invoice lines offered to the return editor

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, Rate, SalesInvoiceId, SalesInvoiceItemId};
use domain_sales::InvoiceLineRecord;

/// An invoice line enriched with its invoice's VAT figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnableInvoiceLine {
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
    /// VAT rate of the invoice as a ratio, zero without a VAT row
    pub vat_rate_ratio: Decimal,
    /// `qty * rate * vat_rate_ratio`
    pub vat_amount: Money,
    pub original_qty: Decimal,
    /// Upper bound offered to the editor, before earlier returns
    pub max_returnable_qty: Decimal,
    /// Held by submitted credit notes, filled in by the invoice line query
    pub already_returned_qty: Decimal,
}

impl ReturnableInvoiceLine {
    pub fn from_record(record: InvoiceLineRecord, vat_rate: Rate) -> Self {
        let ratio = vat_rate.as_decimal();
        let line_amount = record.rate.multiply(record.qty);
        let vat_amount = line_amount.multiply(ratio);

        Self {
            sales_invoice: record.sales_invoice,
            invoice_item_row: record.invoice_item_row,
            sales_invoice_date: record.sales_invoice_date,
            item_code: record.item_code,
            item_name: record.item_name,
            description: record.description,
            qty: record.qty,
            rate: record.rate,
            amount: record.amount,
            uom: record.uom,
            territory: record.territory,
            vat_rate_ratio: ratio,
            vat_amount,
            original_qty: record.qty,
            max_returnable_qty: record.qty.abs(),
            already_returned_qty: Decimal::ZERO,
        }
    }
}
