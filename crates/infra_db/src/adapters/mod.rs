//! Domain Adapters
//!
//! Adapters implement the domain ports on top of the repositories,
//! translating between row types and domain documents.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresErpAdapter;
//! use domain_sales::SalesLedgerPort;
//!
//! let adapter = PostgresErpAdapter::new(pool);
//! let invoice = adapter.get_sales_invoice(invoice_id, None).await?;
//! ```

pub mod erp;

pub use erp::PostgresErpAdapter;
