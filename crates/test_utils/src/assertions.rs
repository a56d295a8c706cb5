//! Custom Test Assertions
//!
//! Assertion helpers for money and generated documents with messages that
//! name the offending row.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_returns::{CombinedSalesReturn, ReturnError, ReturnStatus};
use domain_sales::{DeliveryNote, SalesInvoice};

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a credit note only carries non-positive quantities
pub fn assert_credit_note_quantities(note: &SalesInvoice) {
    assert!(note.is_return, "{} is not a credit note", note.name());
    for item in &note.items {
        assert!(
            item.qty <= Decimal::ZERO,
            "Credit note {} row {} has positive qty {}",
            note.name(),
            item.idx,
            item.qty
        );
    }
}

/// Asserts that a delivery note return only carries non-negative quantities
/// and points back at the delivery note lines it reverses
pub fn assert_delivery_return_quantities(note: &DeliveryNote) {
    assert!(note.is_return, "{} is not a delivery note return", note.name());
    for item in &note.items {
        assert!(
            item.qty >= Decimal::ZERO,
            "Delivery note return {} row {} has negative qty {}",
            note.name(),
            item.idx,
            item.qty
        );
        assert!(
            item.delivery_note_item.is_some(),
            "Delivery note return {} row {} has no originating line",
            note.name(),
            item.idx
        );
    }
}

/// Asserts that a result failed on the remaining-quantity check of `row`
///
/// Returns the remaining quantity reported by the error.
pub fn assert_quantity_exceeded<T: std::fmt::Debug>(result: Result<T, ReturnError>, row: u32) -> Decimal {
    match result {
        Err(ReturnError::QuantityExceeded {
            row: failed_row,
            remaining,
            ..
        }) => {
            assert_eq!(failed_row, row, "Quantity check failed on an unexpected row");
            remaining
        }
        other => panic!("Expected QuantityExceeded on row {}, got {:?}", row, other),
    }
}

/// Asserts the lifecycle status of a return
pub fn assert_return_status(doc: &CombinedSalesReturn, expected: ReturnStatus) {
    assert_eq!(
        doc.status, expected,
        "Return {} is {} but {} was expected",
        doc.name(),
        doc.status,
        expected
    );
}
