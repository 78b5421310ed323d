//! Compensation mechanics: a typed stack of applied, reversible steps.
//!
//! Each successfully applied adjustment is recorded as it happens; on
//! failure the stack replays in reverse, issuing the inverse delta for every
//! recorded step. Compensation is a best-effort forward operation, not a
//! rollback to a snapshot: a compensation failure is logged with full context
//! and never masks the original error.

use stockbook_core::{ProductId, UserId};

use crate::adjust::AdjustmentService;

/// One applied, reversible adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedStep {
    pub product_id: ProductId,
    /// Delta that was applied (negative for consumption).
    pub delta: f64,
    /// Quantity before the step, kept for diagnostics.
    pub prior: f64,
}

/// Applied steps in application order, replayed in reverse on failure.
#[derive(Debug, Default)]
pub struct CompensationStack {
    steps: Vec<AppliedStep>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: AppliedStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[AppliedStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Replay recorded steps in reverse order with inverse deltas.
    ///
    /// Never fails: each compensation outcome is logged individually and the
    /// caller proceeds to return the error that triggered the unwind.
    pub async fn unwind(self, service: &AdjustmentService, user: UserId, note: &str) {
        for step in self.steps.into_iter().rev() {
            match service.adjust(user, step.product_id, -step.delta, note).await {
                Ok(_) => {
                    tracing::info!(
                        product = %step.product_id,
                        delta = -step.delta,
                        "compensated applied step"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        product = %step.product_id,
                        delta = -step.delta,
                        prior = step.prior,
                        error = %err,
                        "compensation failure; stock may need manual correction"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use stockbook_schema::SchemaAdapter;
    use stockbook_store::{InMemoryStockStore, ProductSeed, StockStore};

    use crate::stock::StockLedger;

    fn service_over(store: &Arc<InMemoryStockStore>) -> AdjustmentService {
        let dyn_store = Arc::clone(store) as Arc<dyn StockStore>;
        let schema = Arc::new(SchemaAdapter::new(Arc::clone(&dyn_store)));
        AdjustmentService::new(Arc::clone(&dyn_store), StockLedger::new(dyn_store, schema))
    }

    #[tokio::test]
    async fn unwind_restores_recorded_steps_exactly() {
        let store = Arc::new(InMemoryStockStore::new());
        let user = UserId::new();
        let a = ProductId::new();
        let b = ProductId::new();
        // Quantities as they stand *after* two consumptions were applied.
        store.insert_product(ProductSeed::new(a, "a").owned_by(user).with_stock_quantity(2.0));
        store.insert_product(ProductSeed::new(b, "b").owned_by(user).with_stock_quantity(0.0));

        let mut stack = CompensationStack::new();
        stack.record(AppliedStep { product_id: a, delta: -3.0, prior: 5.0 });
        stack.record(AppliedStep { product_id: b, delta: -4.0, prior: 4.0 });

        stack.unwind(&service_over(&store), user, "rollback").await;

        assert_eq!(store.stored_quantity(a, "stock_quantity"), Some(5.0));
        assert_eq!(store.stored_quantity(b, "stock_quantity"), Some(4.0));
    }

    #[tokio::test]
    async fn one_failed_compensation_does_not_stop_the_rest() {
        let store = Arc::new(InMemoryStockStore::new());
        let user = UserId::new();
        let a = ProductId::new();
        let b = ProductId::new();
        store.insert_product(ProductSeed::new(a, "a").owned_by(user).with_stock_quantity(1.0));
        store.insert_product(ProductSeed::new(b, "b").owned_by(user).with_stock_quantity(1.0));
        store.inject_adjust_failure(b);

        let mut stack = CompensationStack::new();
        stack.record(AppliedStep { product_id: a, delta: -2.0, prior: 3.0 });
        stack.record(AppliedStep { product_id: b, delta: -2.0, prior: 3.0 });

        stack.unwind(&service_over(&store), user, "rollback").await;

        // b's compensation failed (injected), a's still ran.
        assert_eq!(store.stored_quantity(a, "stock_quantity"), Some(3.0));
        assert_eq!(store.stored_quantity(b, "stock_quantity"), Some(1.0));
    }
}
