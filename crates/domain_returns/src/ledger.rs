//! Returned quantity lookups against the sales ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use core_kernel::{OperationMetadata, PortError, SalesInvoiceId, SalesInvoiceItemId, SalesReturnId};
use domain_sales::{DocStatus, ReturnedQtyRow, SalesLedgerPort};

/// Quantity already returned against one invoice line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedQty {
    /// Held by submitted credit notes
    pub submitted: Decimal,
    /// Held by draft credit notes
    pub draft: Decimal,
}

impl ReturnedQty {
    /// Folds per-status rows; cancelled returns count towards neither figure
    pub fn from_rows(rows: &[ReturnedQtyRow]) -> Self {
        rows.iter().fold(Self::default(), |mut acc, row| {
            match row.docstatus {
                DocStatus::Submitted => acc.submitted = row.qty.abs(),
                DocStatus::Draft => acc.draft = row.qty.abs(),
                DocStatus::Cancelled => {}
            }
            acc
        })
    }
}

/// Submitted and draft quantities returned against `invoice_item`
///
/// Draft credit notes generated by `exclude_return` are ignored. Submitted
/// ones count like any other return.
#[instrument(skip(ledger, metadata))]
pub async fn returned_qty_breakdown(
    ledger: &dyn SalesLedgerPort,
    invoice: SalesInvoiceId,
    invoice_item: SalesInvoiceItemId,
    exclude_return: Option<SalesReturnId>,
    metadata: Option<OperationMetadata>,
) -> Result<ReturnedQty, PortError> {
    let rows = ledger
        .returned_qty_by_status(invoice, invoice_item, exclude_return, metadata)
        .await?;
    Ok(ReturnedQty::from_rows(&rows))
}

/// Quantity returned by submitted credit notes only
pub async fn already_returned_qty(
    ledger: &dyn SalesLedgerPort,
    invoice: SalesInvoiceId,
    invoice_item: SalesInvoiceItemId,
    metadata: Option<OperationMetadata>,
) -> Result<Decimal, PortError> {
    returned_qty_breakdown(ledger, invoice, invoice_item, None, metadata)
        .await
        .map(|qty| qty.submitted)
}
