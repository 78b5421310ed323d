//! Stock synchronization for sale and purchase lifecycles.
//!
//! These callers are deliberately thin: each line item yields exactly one
//! adjustment, and failures are collected into a [`SyncReport`] rather than
//! failing the triggering business record. The sale or expense itself is
//! never rolled back because stock sync failed; the caller logs/alerts on the
//! report instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use stockbook_core::{ExpenseId, ProductId, StockError, StockResult, UserId};
use stockbook_schema::SchemaAdapter;
use stockbook_store::StockStore;

use crate::adjust::{Adjustment, AdjustmentService};

const EXPENSE_ITEMS_TABLE: &str = "expense_items";

/// One sold line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: ProductId,
    pub quantity: f64,
}

/// One purchased line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub product_id: ProductId,
    pub quantity: f64,
}

/// Expense classification; only inventory acquisitions move stock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    RawMaterials,
    Merchandise,
    Services,
    Other,
}

impl ExpenseCategory {
    /// Raw-material and finished-goods acquisitions increase stock; service
    /// and general expenses do not.
    pub fn affects_stock(self) -> bool {
        matches!(self, Self::RawMaterials | Self::Merchandise)
    }
}

/// Per-item outcomes of one sync pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    outcomes: Vec<(ProductId, StockResult<Adjustment>)>,
}

impl SyncReport {
    fn push(&mut self, product_id: ProductId, outcome: StockResult<Adjustment>) {
        if let Err(err) = &outcome {
            tracing::warn!(product = %product_id, error = %err, "stock sync failure");
        }
        self.outcomes.push((product_id, outcome));
    }

    pub fn outcomes(&self) -> &[(ProductId, StockResult<Adjustment>)] {
        &self.outcomes
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ProductId, &StockError)> {
        self.outcomes
            .iter()
            .filter_map(|(id, outcome)| outcome.as_ref().err().map(|e| (id, e)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Deducts stock when a sale is recorded; restores it when the sale is
/// deleted.
#[derive(Clone)]
pub struct SalesStockSync {
    adjust: AdjustmentService,
}

impl SalesStockSync {
    pub fn new(adjust: AdjustmentService) -> Self {
        Self { adjust }
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn on_sale_recorded(&self, user: UserId, items: &[SaleItem]) -> SyncReport {
        self.apply(user, items, -1.0, "sale recorded").await
    }

    /// Exact positive inverse of [`on_sale_recorded`](Self::on_sale_recorded)
    /// for the same item set.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn on_sale_deleted(&self, user: UserId, items: &[SaleItem]) -> SyncReport {
        self.apply(user, items, 1.0, "sale deleted").await
    }

    async fn apply(&self, user: UserId, items: &[SaleItem], sign: f64, note: &str) -> SyncReport {
        let mut report = SyncReport::default();
        for item in items {
            let outcome = self
                .adjust
                .adjust(user, item.product_id, sign * item.quantity, note)
                .await;
            report.push(item.product_id, outcome);
        }
        report
    }
}

/// Increments stock for inventory-affecting purchases; reverses the
/// increment when the originating expense is deleted.
#[derive(Clone)]
pub struct PurchaseStockSync {
    store: Arc<dyn StockStore>,
    schema: Arc<SchemaAdapter>,
    adjust: AdjustmentService,
}

impl PurchaseStockSync {
    pub fn new(
        store: Arc<dyn StockStore>,
        schema: Arc<SchemaAdapter>,
        adjust: AdjustmentService,
    ) -> Self {
        Self {
            store,
            schema,
            adjust,
        }
    }

    #[instrument(skip(self, items), fields(items = items.len(), category = ?category))]
    pub async fn on_purchase_recorded(
        &self,
        user: UserId,
        items: &[PurchaseItem],
        category: ExpenseCategory,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        if !category.affects_stock() {
            tracing::debug!("expense category does not affect stock; skipping");
            return report;
        }
        for item in items {
            let outcome = self
                .adjust
                .adjust(user, item.product_id, item.quantity, "purchase recorded")
                .await;
            report.push(item.product_id, outcome);
        }
        report
    }

    /// Re-derive consumed quantities from the stored line items and apply the
    /// positive inverse (a deduction, since recording incremented).
    #[instrument(skip(self), err)]
    pub async fn on_purchase_deleted(
        &self,
        user: UserId,
        expense_id: ExpenseId,
    ) -> StockResult<SyncReport> {
        let scope = self.schema.owner_scope(EXPENSE_ITEMS_TABLE, user).await;
        let items = self
            .store
            .fetch_expense_items(&scope, expense_id)
            .await
            .map_err(|e| StockError::store(e.to_string()))?;

        let mut report = SyncReport::default();
        for item in items {
            let outcome = self
                .adjust
                .adjust(user, item.product_id, -item.quantity, "purchase deleted")
                .await;
            report.push(item.product_id, outcome);
        }
        Ok(report)
    }
}
