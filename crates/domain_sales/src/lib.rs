//! Sales Ledger Domain
//!
//! Sales invoices (including credit notes), delivery notes (including
//! returns), tax schedules and the port through which the ledger is read
//! and written.

pub mod delivery_note;
pub mod error;
pub mod invoice;
pub mod ports;
pub mod status;
pub mod taxes;

pub use delivery_note::{DeliveryNote, DeliveryNoteItem};
pub use error::SalesError;
pub use invoice::{SalesInvoice, SalesInvoiceItem};
pub use ports::{
    BatchReceipt, DocumentBatch, InvoiceLineFilter, InvoiceLineRecord, ReturnedQtyRow,
    SalesLedgerPort,
};
pub use status::DocStatus;
pub use taxes::{vat_rate, ChargeType, SalesTaxCharge, VAT_ACCOUNT_MARKER};
