//! Row-shaped types exchanged across the store boundary.

use serde::{Deserialize, Serialize};

use stockbook_core::{ExpenseId, ProductId, UserId};

/// Which physical column(s) scope rows to their owning user.
///
/// Legacy deployments named the column `owner_id`, current ones `user_id`,
/// and a few mid-migration databases carry both. Resolved once per table by
/// the schema adapter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerPredicate {
    /// `user_id = :caller`
    UserId,
    /// `owner_id = :caller`
    OwnerId,
    /// `user_id = :caller OR owner_id = :caller`
    Either,
}

/// A caller identity bound to the ownership predicate applicable to a table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OwnerScope {
    pub user: UserId,
    pub predicate: OwnerPredicate,
}

impl OwnerScope {
    pub fn new(user: UserId, predicate: OwnerPredicate) -> Self {
        Self { user, predicate }
    }

    /// Row-level ownership check against the two candidate columns.
    ///
    /// Used by the in-memory store; the Postgres store compiles the same
    /// predicate into its WHERE clause.
    pub fn matches(&self, user_id: Option<UserId>, owner_id: Option<UserId>) -> bool {
        match self.predicate {
            OwnerPredicate::UserId => user_id == Some(self.user),
            OwnerPredicate::OwnerId => owner_id == Some(self.user),
            OwnerPredicate::Either => user_id == Some(self.user) || owner_id == Some(self.user),
        }
    }
}

/// One product row, with the quantity read from whichever physical column
/// the caller resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    /// Raw stored quantity; `None` for SQL NULL. Normalization happens in
    /// the ledger, not here.
    pub quantity: Option<f64>,
    pub track_stock: bool,
}

/// One line item of a recorded expense (restocking purchase).
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseItemRecord {
    pub expense_id: ExpenseId,
    pub product_id: ProductId,
    pub quantity: f64,
}

/// Result reported by the server-side `adjust_stock` procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureOutcome {
    pub success: bool,
    pub new_stock: Option<f64>,
    pub message: Option<String>,
}
