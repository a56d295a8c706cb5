//! Return domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use domain_sales::SalesError;

/// Errors raised while maintaining or submitting a combined sales return
#[derive(Debug, Error)]
pub enum ReturnError {
    /// A line asks to return more than is left after submitted returns
    #[error(
        "Return Quantity Exceeded: Row {row} - {item_code}: Original Qty: {original_qty}, \
         Already Returned (Submitted): {already_returned}, Remaining: {remaining}, \
         Attempted Return: {attempted}"
    )]
    QuantityExceeded {
        row: u32,
        item_code: String,
        original_qty: Decimal,
        already_returned: Decimal,
        remaining: Decimal,
        attempted: Decimal,
    },

    /// A line references an invoice line of a different invoice
    #[error("Row {row}: invoice line {invoice_item} does not belong to {invoice}")]
    LineNotOnInvoice {
        row: u32,
        invoice_item: String,
        invoice: String,
    },

    #[error("Customer is required.")]
    CustomerRequired,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sales ledger error: {0}")]
    Sales(#[from] SalesError),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Port error: {0}")]
    Port(#[from] PortError),
}

impl ReturnError {
    /// Returns true when the error rejects the caller's input rather than
    /// reporting an infrastructure failure
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            ReturnError::Port(PortError::Connection { .. } | PortError::Internal { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantity_exceeded_message() {
        let error = ReturnError::QuantityExceeded {
            row: 2,
            item_code: "WIDGET".to_string(),
            original_qty: dec!(10),
            already_returned: dec!(4),
            remaining: dec!(6),
            attempted: dec!(7),
        };
        let message = error.to_string();
        assert!(message.contains("Row 2 - WIDGET"));
        assert!(message.contains("Already Returned (Submitted): 4"));
        assert!(message.contains("Remaining: 6"));
        assert!(message.contains("Attempted Return: 7"));
        assert!(error.is_user_error());
    }

    #[test]
    fn test_port_errors_are_not_user_errors() {
        let error: ReturnError = PortError::internal("disk full").into();
        assert!(!error.is_user_error());

        let missing: ReturnError = PortError::not_found("Sales Invoice Item", "SINVI-1").into();
        assert!(missing.is_user_error());
    }

    #[test]
    fn test_line_on_another_invoice_is_a_user_error() {
        let error = ReturnError::LineNotOnInvoice {
            row: 3,
            invoice_item: "SINVI-1".to_string(),
            invoice: "SINV-2".to_string(),
        };
        assert_eq!(error.to_string(), "Row 3: invoice line SINVI-1 does not belong to SINV-2");
        assert!(error.is_user_error());
    }
}
