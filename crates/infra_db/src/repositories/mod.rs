//! Repository implementations
//!
//! Each repository encapsulates the SQL for one group of tables and maps
//! result sets onto `sqlx::FromRow` row types. Write methods that take a
//! `PgConnection` are meant to run inside a caller-owned transaction.

pub mod returns;
pub mod sales;

pub use returns::ReturnRepository;
pub use sales::SalesRepository;
