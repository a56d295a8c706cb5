//! Property-Based Test Generators
//!
//! Proptest strategies for return lines and quantity scenarios.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money};
use domain_returns::ReturnLine;

/// Currencies with a minor unit of two decimal places
pub fn two_decimal_currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::SAR),
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
    ]
}

/// Whole or fractional quantities up to 1000, never zero
pub fn qty_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Unit rates from 0.01 to 10000.00
pub fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// VAT ratios seen on Gulf invoices
pub fn vat_ratio_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![Just(dec!(0)), Just(dec!(0.05)), Just(dec!(0.15))]
}

/// A free-standing return line in `currency`
pub fn return_line_strategy(currency: Currency) -> impl Strategy<Value = ReturnLine> {
    (qty_strategy(), rate_strategy(), vat_ratio_strategy()).prop_map(move |(qty, rate, vat)| {
        let mut line = ReturnLine::new("ITEM", qty, Money::new(rate, currency));
        line.vat_rate_ratio = vat;
        line
    })
}

/// Original quantity, quantity already returned and quantity attempted
///
/// Already returned never exceeds the original; the attempt may.
pub fn quantity_scenario_strategy() -> impl Strategy<Value = (Decimal, Decimal, Decimal)> {
    (1i64..1_000i64)
        .prop_flat_map(|original| (Just(original), 0..=original, 1i64..1_200i64))
        .prop_map(|(original, returned, attempted)| {
            (Decimal::from(original), Decimal::from(returned), Decimal::from(attempted))
        })
}
