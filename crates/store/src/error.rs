//! Store-level error model.
//!
//! Unlike most error types in this workspace, [`StoreError::Database`] keeps
//! the raw SQLSTATE code and message: the schema probe and the adjustment
//! service classify failures by those signatures (undefined column, missing
//! procedure) and must not lose them to early prettification.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Error reported by the database itself.
    #[error("database error ({}): {message}", code.as_deref().unwrap_or("unknown"))]
    Database {
        /// SQLSTATE code when the driver exposes one (e.g. `42703`).
        code: Option<String>,
        message: String,
    },

    /// Pool/transport failure: the store could not be reached at all.
    #[error("connection failure: {0}")]
    Connection(String),

    /// A row came back in a shape we could not decode.
    #[error("decode failure: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn database(code: Option<impl Into<String>>, message: impl Into<String>) -> Self {
        Self::Database {
            code: code.map(Into::into),
            message: message.into(),
        }
    }

    /// The (code, message) pair of a database-reported error, if this is one.
    ///
    /// Probe classification only ever inspects database-reported errors;
    /// connection and decode failures are always "indeterminate".
    pub fn database_parts(&self) -> Option<(Option<&str>, &str)> {
        match self {
            Self::Database { code, message } => Some((code.as_deref(), message)),
            _ => None,
        }
    }
}
