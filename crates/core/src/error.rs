//! Stock ledger error model.

use serde::Serialize;
use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the ledger layers.
pub type StockResult<T> = Result<T, StockError>;

/// One component that cannot cover the requested consumption.
///
/// Pre-checks report *every* shortfall found, not just the first, so a caller
/// can fix all problems in one round-trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub product_id: ProductId,
    pub name: String,
    pub available: f64,
    pub requested: f64,
}

/// Errors raised by the stock ledger and its callers.
///
/// Keep this focused on deterministic, business-level failures; raw store
/// failures are wrapped in [`StockError::Store`] with the underlying message
/// attached for diagnostics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StockError {
    /// A referenced column genuinely does not exist after probing.
    #[error("column \"{column}\" not found on table \"{table}\"")]
    SchemaMismatch { table: String, column: String },

    /// One or more referenced products do not exist (or are not visible to
    /// the caller).
    #[error("product(s) not found")]
    ProductNotFound { missing: Vec<ProductId> },

    /// Tracking-required operation attempted on a product whose inventory
    /// tracking is disabled.
    #[error("product \"{name}\" does not track stock")]
    UntrackedProduct { product_id: ProductId, name: String },

    /// Applying the adjustment would drive a tracked quantity negative.
    #[error("insufficient stock")]
    InsufficientStock { shortfalls: Vec<Shortfall> },

    /// Request-level validation failure, detected before any mutation.
    #[error("invalid order: {}", violations.join("; "))]
    InvalidOrder { violations: Vec<String> },

    /// The atomic adjustment procedure is not deployed in this environment.
    ///
    /// Internal signal only: the adjustment service consumes it to enter the
    /// read-modify-write fallback. It must never reach an API response.
    #[error("stock adjustment procedure unavailable")]
    ProcedureUnavailable,

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Unexpected failure from the backing store.
    #[error("store failure: {message}")]
    Store { message: String },
}

impl StockError {
    pub fn schema_mismatch(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn product_not_found(missing: Vec<ProductId>) -> Self {
        Self::ProductNotFound { missing }
    }

    pub fn untracked(product_id: ProductId, name: impl Into<String>) -> Self {
        Self::UntrackedProduct {
            product_id,
            name: name.into(),
        }
    }

    pub fn insufficient(shortfalls: Vec<Shortfall>) -> Self {
        Self::InsufficientStock { shortfalls }
    }

    pub fn invalid_order(violations: Vec<String>) -> Self {
        Self::InvalidOrder { violations }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
        }
    }
}
