//! `stockbook-store` — the backing-store boundary of the stock ledger.
//!
//! The rest of the system talks to storage exclusively through the
//! [`StockStore`] trait. Two implementations are provided:
//!
//! - [`PostgresStockStore`]: the production store (sqlx connection pool).
//! - [`InMemoryStockStore`]: tests/dev, with configurable schema drift,
//!   procedure availability, and injected failures.
//!
//! Errors deliberately preserve the database's error code and message
//! (see [`StoreError`]): the schema probe upstream classifies failures by
//! those signatures to tell "column missing" apart from a real outage.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod types;

mod r#trait;

pub use error::StoreError;
pub use memory::{InMemoryStockStore, ProductSeed};
pub use postgres::PostgresStockStore;
pub use r#trait::StockStore;
pub use types::{ExpenseItemRecord, OwnerPredicate, OwnerScope, ProcedureOutcome, ProductRecord};
