//! The storage contract consumed by the schema adapter and the ledger.

use async_trait::async_trait;

use stockbook_core::{ExpenseId, ProductId};

use crate::error::StoreError;
use crate::types::{ExpenseItemRecord, OwnerScope, ProcedureOutcome, ProductRecord};

/// Backing-store operations needed by the stock ledger.
///
/// Column names are passed in by the caller because they are not fixed: the
/// schema adapter resolves the physical quantity column (`stock_quantity` vs
/// `stock`) and the ownership predicate at call time. Implementations must
/// surface "undefined column" and "undefined function" database errors with
/// their code/message intact so callers can classify them.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Minimal read restricted to one column, issued purely to test whether
    /// that column exists. Row contents are discarded.
    async fn probe_column(&self, table: &str, column: &str) -> Result<(), StoreError>;

    /// Fetch a single product row visible to the owner scope, reading the
    /// quantity from `quantity_column`.
    async fn fetch_product(
        &self,
        scope: &OwnerScope,
        id: ProductId,
        quantity_column: &str,
    ) -> Result<Option<ProductRecord>, StoreError>;

    /// Batched variant of [`fetch_product`](Self::fetch_product); rows for
    /// unknown ids are simply absent from the result.
    async fn fetch_products(
        &self,
        scope: &OwnerScope,
        ids: &[ProductId],
        quantity_column: &str,
    ) -> Result<Vec<ProductRecord>, StoreError>;

    /// Set `column` to `value` on one product row. Returns the number of
    /// rows affected (0 when the row is missing or not owned).
    async fn update_product_quantity(
        &self,
        scope: &OwnerScope,
        id: ProductId,
        column: &str,
        value: f64,
    ) -> Result<u64, StoreError>;

    /// Invoke the atomic server-side stock adjustment procedure.
    ///
    /// Environments that never deployed the procedure report an undefined-
    /// function database error; the adjustment service recognizes that
    /// signature and falls back to read-modify-write.
    async fn call_adjust_procedure(
        &self,
        id: ProductId,
        delta: f64,
        note: &str,
    ) -> Result<ProcedureOutcome, StoreError>;

    /// Line items recorded under an expense, used to reverse a purchase's
    /// stock effect when the expense is deleted.
    async fn fetch_expense_items(
        &self,
        scope: &OwnerScope,
        expense_id: ExpenseId,
    ) -> Result<Vec<ExpenseItemRecord>, StoreError>;
}
