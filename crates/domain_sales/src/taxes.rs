//! Sales tax schedules
//!
//! A sales invoice carries an ordered schedule of tax rows. Each row is
//! evaluated against the invoice's net total or against an earlier row,
//! mirroring how a "Sales Taxes and Charges" table behaves.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{Currency, Money, Rate};
use crate::error::SalesError;

/// Account-head marker identifying the VAT row in a tax schedule
pub const VAT_ACCOUNT_MARKER: &str = "VAT";

/// How a tax row's amount is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    /// A fixed amount entered on the row
    Actual,
    /// Percentage of the invoice net total
    OnNetTotal,
    /// Percentage of an earlier row's tax amount
    OnPreviousRowAmount,
    /// Percentage of an earlier row's running total
    OnPreviousRowTotal,
}

impl ChargeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeType::Actual => "Actual",
            ChargeType::OnNetTotal => "On Net Total",
            ChargeType::OnPreviousRowAmount => "On Previous Row Amount",
            ChargeType::OnPreviousRowTotal => "On Previous Row Total",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Actual" => Some(ChargeType::Actual),
            "On Net Total" => Some(ChargeType::OnNetTotal),
            "On Previous Row Amount" => Some(ChargeType::OnPreviousRowAmount),
            "On Previous Row Total" => Some(ChargeType::OnPreviousRowTotal),
            _ => None,
        }
    }
}

impl fmt::Display for ChargeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of a sales tax schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesTaxCharge {
    /// 1-based position in the schedule
    pub idx: u32,
    pub charge_type: ChargeType,
    /// Referenced row (1-based) for the "previous row" charge types
    pub row_id: Option<u32>,
    pub account_head: String,
    pub description: Option<String>,
    /// Percentage rate (15 means 15%)
    pub rate: Decimal,
    pub included_in_print_rate: bool,
    pub cost_center: Option<String>,
    /// Computed tax for this row (entered directly for `Actual`)
    pub tax_amount: Money,
    /// Running total after this row
    pub total: Money,
}

impl SalesTaxCharge {
    /// Creates a tax row with zero computed amounts
    pub fn new(
        charge_type: ChargeType,
        account_head: impl Into<String>,
        rate: Decimal,
        currency: Currency,
    ) -> Self {
        Self {
            idx: 0,
            charge_type,
            row_id: None,
            account_head: account_head.into(),
            description: None,
            rate,
            included_in_print_rate: false,
            cost_center: None,
            tax_amount: Money::zero(currency),
            total: Money::zero(currency),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.cost_center = Some(cost_center.into());
        self
    }

    pub fn with_row_id(mut self, row_id: u32) -> Self {
        self.row_id = Some(row_id);
        self
    }

    pub fn included_in_print_rate(mut self) -> Self {
        self.included_in_print_rate = true;
        self
    }

    /// Fixed amount for an `Actual` charge
    pub fn with_tax_amount(mut self, amount: Money) -> Self {
        self.tax_amount = amount;
        self
    }

    /// Copies the row's configuration onto a return document
    ///
    /// Charge type, account head, description, rate, print-rate inclusion
    /// and cost center are carried over; computed amounts start at zero and
    /// are recalculated on the receiving document.
    pub fn copy_for_return(&self, currency: Currency) -> Self {
        Self {
            idx: 0,
            charge_type: self.charge_type,
            row_id: self.row_id,
            account_head: self.account_head.clone(),
            description: self.description.clone(),
            rate: self.rate,
            included_in_print_rate: self.included_in_print_rate,
            cost_center: self.cost_center.clone(),
            tax_amount: Money::zero(currency),
            total: Money::zero(currency),
        }
    }

    /// Returns true if this row books VAT
    pub fn is_vat(&self, marker: &str) -> bool {
        self.account_head
            .to_uppercase()
            .contains(&marker.to_uppercase())
    }
}

/// Resolves the VAT rate of a tax schedule
///
/// The first row whose account head contains `marker` (case-insensitive)
/// supplies the rate. A schedule without a VAT row yields a zero rate.
pub fn vat_rate(taxes: &[SalesTaxCharge], marker: &str) -> Rate {
    taxes
        .iter()
        .find(|tax| tax.is_vat(marker))
        .map(|tax| Rate::from_percentage(tax.rate))
        .unwrap_or_else(Rate::zero)
}

/// Sum of the "On Net Total" rates included in the print rate, as a ratio
pub(crate) fn inclusive_ratio(taxes: &[SalesTaxCharge]) -> Result<Decimal, SalesError> {
    let mut ratio = Decimal::ZERO;
    for tax in taxes.iter().filter(|t| t.included_in_print_rate) {
        if tax.charge_type != ChargeType::OnNetTotal {
            return Err(SalesError::UnsupportedInclusiveCharge(
                tax.charge_type.to_string(),
            ));
        }
        ratio += tax.rate / dec!(100);
    }
    Ok(ratio)
}

/// Evaluates a tax schedule against `net_total`
///
/// Updates every row's `tax_amount` and running `total` in place and
/// returns the sum of all tax amounts.
pub(crate) fn apply_schedule(
    taxes: &mut [SalesTaxCharge],
    net_total: Money,
) -> Result<Money, SalesError> {
    let currency = net_total.currency();
    let mut running = net_total;
    let mut total_taxes = Money::zero(currency);

    for position in 0..taxes.len() {
        let row_number = position as u32 + 1;
        let rate = Rate::from_percentage(taxes[position].rate);

        let tax_amount = match taxes[position].charge_type {
            ChargeType::Actual => taxes[position].tax_amount,
            ChargeType::OnNetTotal => rate.apply(&net_total),
            ChargeType::OnPreviousRowAmount | ChargeType::OnPreviousRowTotal => {
                let reference = taxes[position].row_id;
                let referenced = match reference {
                    Some(r) if r >= 1 && r < row_number => &taxes[(r - 1) as usize],
                    _ => {
                        return Err(SalesError::InvalidTaxRow {
                            row: row_number,
                            reference,
                        })
                    }
                };
                if taxes[position].charge_type == ChargeType::OnPreviousRowAmount {
                    rate.apply(&referenced.tax_amount)
                } else {
                    rate.apply(&referenced.total)
                }
            }
        }
        .round_to_currency();

        running = running.checked_add(&tax_amount)?;
        total_taxes = total_taxes.checked_add(&tax_amount)?;

        let row = &mut taxes[position];
        row.idx = row_number;
        row.tax_amount = tax_amount;
        row.total = running;
    }

    Ok(total_taxes)
}
