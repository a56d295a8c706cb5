//! Sales domain errors

use thiserror::Error;

use core_kernel::MoneyError;

/// Errors that can occur in the sales ledger domain
#[derive(Debug, Error)]
pub enum SalesError {
    /// Document has no item lines
    #[error("{0} has no items")]
    EmptyDocument(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// A tax row references a row that does not precede it
    #[error("Tax row {row} references invalid row {reference:?}")]
    InvalidTaxRow { row: u32, reference: Option<u32> },

    /// Only "On Net Total" charges may be included in the print rate
    #[error("Charge type {0} cannot be included in the print rate")]
    UnsupportedInclusiveCharge(String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
