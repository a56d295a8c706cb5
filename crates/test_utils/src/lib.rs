//! Test Utilities Crate
//!
//! Shared test infrastructure for the combined sales return workspace.
//!
//! # Modules
//!
//! - `fixtures`: fixed money, dates, tax rows and callers
//! - `builders`: invoices, delivery notes, credit notes and return drafts
//! - `database`: PostgreSQL container management
//! - `assertions`: assertion helpers for generated documents
//! - `generators`: property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;

use once_cell::sync::Lazy;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

/// Routes tracing output through the test harness; safe to call from every test
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
