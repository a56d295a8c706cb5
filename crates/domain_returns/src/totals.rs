//! Document totals

use rust_decimal::Decimal;

use core_kernel::{money_in_words, Money, MoneyError};
use crate::document::{CombinedSalesReturn, ReturnLine};

/// Recomputes a line's amount and VAT from its quantity and rate
pub fn refresh_line_amounts(line: &mut ReturnLine) {
    let amount = line.rate.multiply(line.qty.abs()).round_to_currency();
    line.total_amount = amount;
    line.vat_amount = amount.multiply(line.vat_rate_ratio).round_to_currency();
}

/// Recomputes line amounts and the document totals, including `in_words`
pub fn calculate_totals(doc: &mut CombinedSalesReturn) -> Result<(), MoneyError> {
    let currency = doc.currency;
    let mut total_qty = Decimal::ZERO;
    let mut total = Money::zero(currency);
    let mut total_taxes = Money::zero(currency);

    for line in &mut doc.items {
        refresh_line_amounts(line);
        total_qty += line.qty.abs();
        total = total.checked_add(&line.total_amount)?;
        total_taxes = total_taxes.checked_add(&line.vat_amount)?;
    }

    let grand_total = total.checked_add(&total_taxes)?;

    doc.total_qty = total_qty;
    doc.total = total;
    doc.total_taxes = total_taxes;
    doc.grand_total = grand_total;
    doc.in_words = money_in_words(grand_total.amount(), currency)?;
    Ok(())
}
