//! Combined Sales Return Domain
//!
//! A combined sales return collects returned lines from several sales
//! invoices of one customer. This crate covers:
//! - quantity validation against earlier returns
//! - document totals and the amount in words
//! - credit note generation, one per source invoice
//! - delivery note return generation, one per source delivery note
//! - submission as a single atomic batch

pub mod credit_note;
pub mod delivery_return;
pub mod document;
pub mod error;
pub mod ledger;
pub mod ports;
pub mod returnable;
pub mod service;
pub mod totals;
pub mod validation;

pub use credit_note::{CreditNoteSummary, GeneratedCreditNote};
pub use document::{CombinedSalesReturn, ReturnLine, ReturnStatus};
pub use error::ReturnError;
pub use ledger::ReturnedQty;
pub use ports::ReturnDocumentPort;
pub use returnable::ReturnableInvoiceLine;
pub use service::{
    InvoiceItemsQuery, NewReturn, ReturnChanges, ReturnSettings, SalesReturnService,
    SavedReturn, SubmissionOutcome,
};
pub use validation::ReturnNotice;
