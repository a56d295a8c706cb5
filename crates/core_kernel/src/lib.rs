//! Core Kernel - Foundational types shared by the sales and returns domains
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Amount-in-words rendering for printed totals
//! - Strongly-typed document identifiers
//! - Repository port infrastructure (errors, health checks, caller metadata)

pub mod money;
pub mod words;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use words::money_in_words;
pub use identifiers::{
    CustomerId, SalesInvoiceId, SalesInvoiceItemId, DeliveryNoteId, DeliveryNoteItemId,
    SalesReturnId, ReturnLineId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};
