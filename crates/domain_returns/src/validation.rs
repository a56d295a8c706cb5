//! Return quantity validation
//!
//! A line may return at most what is left on its invoice line after
//! submitted credit notes. Draft credit notes never block; they only
//! produce an advisory notice.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{instrument, warn};

use core_kernel::{OperationMetadata, SalesInvoiceItemId};
use domain_sales::SalesLedgerPort;

use crate::document::{CombinedSalesReturn, ReturnLine};
use crate::error::ReturnError;
use crate::ledger::{returned_qty_breakdown, ReturnedQty};

/// Non-blocking notice about draft returns overlapping a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnNotice {
    /// 1-based row on the return document
    pub row: u32,
    pub item_code: String,
    /// Quantity held by draft credit notes
    pub draft_qty: Decimal,
}

impl fmt::Display for ReturnNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Notice for Row {} - {}: There are draft Sales Returns with quantity {} for this \
             invoice item. Quantity validation is performed against submitted returns only.",
            self.row, self.item_code, self.draft_qty
        )
    }
}

/// Checks one line against the quantities already returned
pub fn check_line(
    row: u32,
    line: &ReturnLine,
    returned: ReturnedQty,
) -> Result<Option<ReturnNotice>, ReturnError> {
    let original_qty = line.original_qty.abs();
    let attempted = line.qty.abs();
    let remaining = original_qty - returned.submitted;

    if attempted > remaining {
        return Err(ReturnError::QuantityExceeded {
            row,
            item_code: line.item_code.clone(),
            original_qty,
            already_returned: returned.submitted,
            remaining,
            attempted,
        });
    }

    if returned.draft > Decimal::ZERO {
        return Ok(Some(ReturnNotice {
            row,
            item_code: line.item_code.clone(),
            draft_qty: returned.draft,
        }));
    }

    Ok(None)
}

/// Validates every linked line of `doc`
///
/// Each line's original quantity is reloaded from its invoice line, which
/// must belong to the referenced invoice. Returned quantities are refreshed,
/// and earlier rows of `doc` on the same invoice line count as already
/// returned. Stops at the first line that exceeds its remaining quantity
/// and collects draft notices otherwise. Lines without both invoice
/// references are skipped.
#[instrument(skip(ledger, doc, metadata), fields(sales_return = %doc.id))]
pub async fn validate_return_quantities(
    ledger: &dyn SalesLedgerPort,
    doc: &mut CombinedSalesReturn,
    metadata: Option<OperationMetadata>,
) -> Result<Vec<ReturnNotice>, ReturnError> {
    let exclude = Some(doc.id);
    let mut notices = Vec::new();
    let mut claimed: HashMap<SalesInvoiceItemId, Decimal> = HashMap::new();

    for (position, line) in doc.items.iter_mut().enumerate() {
        let row = position as u32 + 1;
        let (invoice, invoice_item) = match (line.linked_invoice, line.sales_invoice_item) {
            (Some(invoice), Some(item)) => (invoice, item),
            _ => continue,
        };

        let source = ledger.get_sales_invoice_item(invoice_item, metadata.clone()).await?;
        if source.parent != invoice {
            return Err(ReturnError::LineNotOnInvoice {
                row,
                invoice_item: invoice_item.to_string(),
                invoice: invoice.to_string(),
            });
        }
        line.original_qty = source.qty.abs();

        let returned =
            returned_qty_breakdown(ledger, invoice, invoice_item, exclude, metadata.clone()).await?;
        line.already_returned_qty = returned.submitted;
        line.draft_returned_qty = returned.draft;

        let earlier_rows = claimed.entry(invoice_item).or_insert(Decimal::ZERO);
        let committed = ReturnedQty {
            submitted: returned.submitted + *earlier_rows,
            draft: returned.draft,
        };
        *earlier_rows += line.qty.abs();

        if let Some(notice) = check_line(row, line, committed)? {
            warn!(row = notice.row, item_code = %notice.item_code, draft_qty = %notice.draft_qty, "{}", notice);
            notices.push(notice);
        }
    }

    Ok(notices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, Money, SalesInvoiceId, SalesInvoiceItemId};
    use rust_decimal_macros::dec;

    fn linked_line(original: Decimal, qty: Decimal) -> ReturnLine {
        let mut line = ReturnLine::new("WIDGET", qty, Money::new(dec!(10), Currency::SAR));
        line.linked_invoice = Some(SalesInvoiceId::new_v7());
        line.sales_invoice_item = Some(SalesInvoiceItemId::new_v7());
        line.original_qty = original;
        line
    }

    fn submitted(qty: Decimal) -> ReturnedQty {
        ReturnedQty { submitted: qty, draft: Decimal::ZERO }
    }

    #[test]
    fn test_remaining_quantity_is_enforced() {
        let result = check_line(1, &linked_line(dec!(10), dec!(7)), submitted(dec!(4)));
        match result {
            Err(ReturnError::QuantityExceeded { row, remaining, attempted, already_returned, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(remaining, dec!(6));
                assert_eq!(attempted, dec!(7));
                assert_eq!(already_returned, dec!(4));
            }
            other => panic!("expected QuantityExceeded, got {:?}", other),
        }

        assert!(check_line(1, &linked_line(dec!(10), dec!(6)), submitted(dec!(4)))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_draft_overlap_only_warns() {
        let returned = ReturnedQty { submitted: Decimal::ZERO, draft: dec!(8) };
        let notice = check_line(3, &linked_line(dec!(10), dec!(10)), returned)
            .unwrap()
            .unwrap();
        assert_eq!(notice.row, 3);
        assert_eq!(notice.draft_qty, dec!(8));
        assert!(notice.to_string().contains("submitted returns only"));
    }

    #[test]
    fn test_negative_original_quantity_uses_magnitude() {
        assert!(check_line(1, &linked_line(dec!(-5), dec!(5)), ReturnedQty::default()).is_ok());
    }
}
