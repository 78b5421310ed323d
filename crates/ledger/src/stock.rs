//! Single-product quantity reads and writes.

use std::sync::Arc;

use tracing::instrument;

use stockbook_core::{ProductId, StockError, StockResult, UserId, normalize_quantity};
use stockbook_schema::{SchemaAdapter, is_missing_column};
use stockbook_store::{OwnerScope, ProductRecord, StockStore, StoreError};

/// Table holding product rows.
pub const PRODUCTS_TABLE: &str = "products";

/// Quantity column candidates, current name first.
pub const QUANTITY_COLUMNS: &[&str] = &["stock_quantity", "stock"];

/// The other quantity column of the drift pair, if `column` is one of them.
fn sibling_column(column: &str) -> Option<&'static str> {
    match column {
        "stock_quantity" => Some("stock"),
        "stock" => Some("stock_quantity"),
        _ => None,
    }
}

fn map_store_error(err: StoreError, column: &str) -> StockError {
    if is_missing_column(&err) {
        StockError::schema_mismatch(PRODUCTS_TABLE, column)
    } else {
        StockError::store(err.to_string())
    }
}

/// One product's stock state, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductStock {
    pub id: ProductId,
    pub name: String,
    /// On-hand quantity; always finite and non-negative.
    pub quantity: f64,
    /// Whether the ledger maintains this product's quantity at all.
    /// Untracked products are never validated or mutated.
    pub track_stock: bool,
}

impl ProductStock {
    fn from_record(record: ProductRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            quantity: normalize_quantity(record.quantity),
            track_stock: record.track_stock,
        }
    }
}

/// Reads and writes a product's on-hand quantity through the schema adapter.
#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn StockStore>,
    schema: Arc<SchemaAdapter>,
}

impl StockLedger {
    pub fn new(store: Arc<dyn StockStore>, schema: Arc<SchemaAdapter>) -> Self {
        Self { store, schema }
    }

    /// Ownership scope for the products table, bound to the caller.
    pub async fn owner_scope(&self, user: UserId) -> OwnerScope {
        self.schema.owner_scope(PRODUCTS_TABLE, user).await
    }

    async fn quantity_column(&self) -> String {
        self.schema
            .resolve_column(PRODUCTS_TABLE, QUANTITY_COLUMNS)
            .await
    }

    /// Fetch one product's stock state. `ProductNotFound` covers both a
    /// missing row and a row not visible to the caller.
    #[instrument(skip(self), err)]
    pub async fn read(&self, user: UserId, id: ProductId) -> StockResult<ProductStock> {
        let column = self.quantity_column().await;
        let scope = self.owner_scope(user).await;
        let record = self
            .store
            .fetch_product(&scope, id, &column)
            .await
            .map_err(|e| map_store_error(e, &column))?
            .ok_or_else(|| StockError::product_not_found(vec![id]))?;
        Ok(ProductStock::from_record(record))
    }

    /// Batched read; rows missing from the result were not found. The caller
    /// decides whether that is an error.
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn read_many(
        &self,
        user: UserId,
        ids: &[ProductId],
    ) -> StockResult<Vec<ProductStock>> {
        let column = self.quantity_column().await;
        let scope = self.owner_scope(user).await;
        let records = self
            .store
            .fetch_products(&scope, ids, &column)
            .await
            .map_err(|e| map_store_error(e, &column))?;
        Ok(records.into_iter().map(ProductStock::from_record).collect())
    }

    /// Overwrite a product's on-hand quantity.
    ///
    /// Deployments mid-migration still carry *both* quantity columns, so a
    /// best-effort write of the sibling column follows the primary one. The
    /// sibling write never fails the operation; once schemas are unified this
    /// shim can be deleted in one place.
    #[instrument(skip(self), err)]
    pub async fn write(&self, user: UserId, id: ProductId, quantity: f64) -> StockResult<()> {
        let column = self.quantity_column().await;
        let scope = self.owner_scope(user).await;

        let affected = self
            .store
            .update_product_quantity(&scope, id, &column, quantity)
            .await
            .map_err(|e| map_store_error(e, &column))?;
        if affected == 0 {
            return Err(StockError::product_not_found(vec![id]));
        }

        if let Some(sibling) = sibling_column(&column) {
            if let Err(err) = self
                .store
                .update_product_quantity(&scope, id, sibling, quantity)
                .await
            {
                tracing::debug!(
                    product = %id,
                    column = sibling,
                    error = %err,
                    "sibling quantity column not updated"
                );
            }
        }
        Ok(())
    }
}
