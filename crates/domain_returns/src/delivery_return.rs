//! Delivery note return generation
//!
//! Stock goes back through the delivery note it left on. The delivery note
//! is found through the source invoice line, not through the invoice.

use chrono::NaiveDate;
use tracing::{debug, instrument};

use core_kernel::{DeliveryNoteId, OperationMetadata, SalesReturnId};
use domain_sales::{DeliveryNote, DeliveryNoteItem, SalesLedgerPort};

use crate::document::ReturnLine;
use crate::error::ReturnError;

/// Groups lines by the delivery note of their source invoice line
///
/// Lines without an invoice line, or whose invoice line was never
/// delivered, are left out. Groups keep the order of first appearance.
pub async fn group_by_delivery_note<'a>(
    ledger: &dyn SalesLedgerPort,
    lines: &'a [ReturnLine],
    metadata: Option<OperationMetadata>,
) -> Result<Vec<(DeliveryNoteId, Vec<&'a ReturnLine>)>, ReturnError> {
    let mut groups: Vec<(DeliveryNoteId, Vec<&'a ReturnLine>)> = Vec::new();

    for line in lines {
        let Some(item_id) = line.sales_invoice_item else {
            continue;
        };
        let invoice_item = ledger.get_sales_invoice_item(item_id, metadata.clone()).await?;
        let Some(delivery_note) = invoice_item.delivery_note else {
            continue;
        };

        match groups.iter_mut().find(|(id, _)| *id == delivery_note) {
            Some((_, members)) => members.push(line),
            None => groups.push((delivery_note, vec![line])),
        }
    }

    Ok(groups)
}

/// Builds a submitted return against `delivery_note` for `lines`
///
/// Quantities are positive. Warehouse and the originating delivery note
/// line come from each source invoice line; lines whose invoice line lacks
/// either delivery reference are skipped. Returns `None` when no line
/// survives.
#[instrument(skip(ledger, lines, metadata))]
pub async fn build_delivery_note_return(
    ledger: &dyn SalesLedgerPort,
    delivery_note: DeliveryNoteId,
    lines: &[&ReturnLine],
    combined_sales_return: SalesReturnId,
    posting_date: NaiveDate,
    metadata: Option<OperationMetadata>,
) -> Result<Option<DeliveryNote>, ReturnError> {
    let original = ledger.get_delivery_note(delivery_note, metadata.clone()).await?;

    let mut note = DeliveryNote::new_return_against(&original, posting_date);
    note.combined_sales_return = Some(combined_sales_return);

    for line in lines {
        let Some(item_id) = line.sales_invoice_item else {
            continue;
        };
        let invoice_item = ledger.get_sales_invoice_item(item_id, metadata.clone()).await?;
        let (Some(_), Some(dn_detail)) = (invoice_item.delivery_note, invoice_item.dn_detail) else {
            continue;
        };

        note.add_item(
            DeliveryNoteItem::new(line.item_code.clone(), line.qty.abs())
                .with_uom(line.uom.clone())
                .with_warehouse(invoice_item.warehouse.clone())
                .returning(dn_detail),
        );
    }

    if note.items.is_empty() {
        debug!(delivery_note = %delivery_note, "No returnable lines, skipping delivery note return");
        return Ok(None);
    }

    note.submit()?;
    Ok(Some(note))
}
