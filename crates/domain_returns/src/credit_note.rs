//! Credit note generation
//!
//! Lines are grouped by the invoice they were billed on; each group becomes
//! one return invoice against that invoice.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

use core_kernel::{OperationMetadata, SalesInvoiceId};
use domain_sales::{SalesInvoice, SalesInvoiceItem, SalesLedgerPort};

use crate::document::{CombinedSalesReturn, ReturnLine};
use crate::error::ReturnError;

/// A credit note built for one source invoice
#[derive(Debug, Clone)]
pub struct GeneratedCreditNote {
    pub source_invoice: SalesInvoiceId,
    pub credit_note: SalesInvoice,
}

impl GeneratedCreditNote {
    pub fn summary(&self) -> CreditNoteSummary {
        CreditNoteSummary {
            invoice: self.source_invoice.to_string(),
            credit_note: self.credit_note.name(),
        }
    }
}

/// One line of the credit note report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditNoteSummary {
    pub invoice: String,
    pub credit_note: String,
}

impl fmt::Display for CreditNoteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credit Note created for {}: {}", self.invoice, self.credit_note)
    }
}

/// Joins summaries into the newline-separated report
pub fn summarize(summaries: &[CreditNoteSummary]) -> String {
    summaries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Groups lines by source invoice, in order of first appearance
pub fn group_by_invoice(lines: &[ReturnLine]) -> Vec<(SalesInvoiceId, Vec<&ReturnLine>)> {
    let mut groups: Vec<(SalesInvoiceId, Vec<&ReturnLine>)> = Vec::new();
    for line in lines {
        let Some(invoice) = line.linked_invoice else {
            continue;
        };
        match groups.iter_mut().find(|(id, _)| *id == invoice) {
            Some((_, members)) => members.push(line),
            None => groups.push((invoice, vec![line])),
        }
    }
    groups
}

/// Builds the credit note for one invoice group
///
/// Item quantities are negative; the tax schedule of the source invoice is
/// copied and totals are recomputed. With `submit` the note is finalized.
pub fn build_credit_note(
    source: &SalesInvoice,
    lines: &[&ReturnLine],
    combined_sales_return: &CombinedSalesReturn,
    posting_date: NaiveDate,
    submit: bool,
) -> Result<SalesInvoice, ReturnError> {
    let mut credit_note = SalesInvoice::new_return_against(source, posting_date);
    credit_note.combined_sales_return = Some(combined_sales_return.id);

    for line in lines {
        let mut item = SalesInvoiceItem::new(line.item_code.clone(), line.credit_note_qty(), line.rate);
        item.item_name = line.item_name.clone();
        item.uom = line.uom.clone();
        item.territory = line.territory.clone();
        item.sales_invoice_item = line.sales_invoice_item;
        credit_note.add_item(item);
    }

    for tax in &source.taxes {
        credit_note.add_tax(tax.copy_for_return(source.currency));
    }

    credit_note.calculate_taxes_and_totals()?;
    if submit {
        credit_note.submit()?;
    }
    Ok(credit_note)
}

/// Builds one credit note per source invoice of `doc`
///
/// Nothing is stored; the caller persists the returned documents.
#[instrument(skip(ledger, doc, metadata), fields(sales_return = %doc.id))]
pub async fn build_credit_notes(
    ledger: &dyn SalesLedgerPort,
    doc: &CombinedSalesReturn,
    posting_date: NaiveDate,
    submit: bool,
    metadata: Option<OperationMetadata>,
) -> Result<Vec<GeneratedCreditNote>, ReturnError> {
    let mut generated = Vec::new();

    for (invoice, lines) in group_by_invoice(&doc.items) {
        let source = ledger.get_sales_invoice(invoice, metadata.clone()).await?;
        let credit_note = build_credit_note(&source, &lines, doc, posting_date, submit)?;
        debug!(invoice = %invoice, credit_note = %credit_note.id, lines = lines.len(), "Built credit note");
        generated.push(GeneratedCreditNote {
            source_invoice: invoice,
            credit_note,
        });
    }

    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, CustomerId, Money};
    use rust_decimal_macros::dec;

    fn line_for(invoice: SalesInvoiceId, code: &str) -> ReturnLine {
        let mut line = ReturnLine::new(code, dec!(1), Money::new(dec!(5), Currency::SAR));
        line.linked_invoice = Some(invoice);
        line
    }

    #[test]
    fn test_grouping_keeps_first_seen_order() {
        let a = SalesInvoiceId::new_v7();
        let b = SalesInvoiceId::new_v7();
        let lines = vec![
            line_for(b, "X"),
            line_for(a, "Y"),
            ReturnLine::new("FREE", dec!(1), Money::new(dec!(1), Currency::SAR)),
            line_for(b, "Z"),
        ];

        let groups = group_by_invoice(&lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, b);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, a);
    }

    #[test]
    fn test_summary_format() {
        let summaries = vec![
            CreditNoteSummary { invoice: "SINV-1".into(), credit_note: "SINV-9".into() },
            CreditNoteSummary { invoice: "SINV-2".into(), credit_note: "SINV-8".into() },
        ];
        assert_eq!(
            summarize(&summaries),
            "Credit Note created for SINV-1: SINV-9\nCredit Note created for SINV-2: SINV-8"
        );
        assert_eq!(summarize(&[]), "");
    }

    #[test]
    fn test_credit_note_quantities_are_negative() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut source = SalesInvoice::new("Acme KSA", CustomerId::new_v7(), date, Currency::SAR);
        source.add_item(SalesInvoiceItem::new("X", dec!(4), Money::new(dec!(5), Currency::SAR)));

        let doc = CombinedSalesReturn::new("Acme KSA", source.customer, date, Currency::SAR);
        let line = line_for(source.id, "X");
        let note = build_credit_note(&source, &[&line], &doc, date, false).unwrap();

        assert!(note.is_return);
        assert_eq!(note.items[0].qty, dec!(-1));
        assert_eq!(note.combined_sales_return, Some(doc.id));
        assert!(!note.is_submitted());
    }
}
