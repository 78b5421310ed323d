//! `stockbook-core` — domain foundation for the stock ledger.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the stock error taxonomy, and quantity
//! normalization rules.

pub mod error;
pub mod id;
pub mod quantity;

pub use error::{Shortfall, StockError, StockResult};
pub use id::{ExpenseId, ProductId, UserId};
pub use quantity::normalize_quantity;
