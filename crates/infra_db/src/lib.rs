//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the sales ledger (invoices, credit notes,
//! delivery notes and their returns) and for combined sales returns,
//! built on SQLx.
//!
//! # Architecture
//!
//! Repositories own the SQL and work on plain row types. The
//! [`adapters::PostgresErpAdapter`] maps rows onto domain documents and
//! implements the domain ports, running every multi-document write in a
//! single transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresErpAdapter};
//!
//! let pool = create_pool(DatabaseConfig::default()).await?;
//! run_migrations(&pool).await?;
//! let adapter = PostgresErpAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::PostgresErpAdapter;
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool, DEFAULT_DATABASE_URL};
