//! The manufacturing saga: N component consumptions + 1 production.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use stockbook_core::{ProductId, Shortfall, StockError, StockResult, UserId};

use crate::adjust::{AdjustmentService, Mechanism};
use crate::saga::{AppliedStep, CompensationStack};
use crate::stock::{ProductStock, StockLedger};

/// One component requirement of a manufacturing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLine {
    pub product_id: ProductId,
    pub quantity: f64,
    pub unit: Option<String>,
}

/// A request to consume components and produce one finished good.
///
/// Entirely request-scoped: constructed, validated, executed, discarded. No
/// persistent record of the order itself is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturingOrder {
    pub finished_product_id: ProductId,
    pub output_quantity: f64,
    pub output_unit: Option<String>,
    pub components: Vec<ComponentLine>,
    pub notes: Option<String>,
}

/// Result of a fully successful manufacturing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingSummary {
    pub finished_product_id: ProductId,
    pub finished_product_name: String,
    pub output_quantity: f64,
    pub output_unit: Option<String>,
    /// Distinct components consumed (duplicate lines merged).
    pub components_count: usize,
}

/// Request-level validation, performed before any store access.
fn validate(order: &ManufacturingOrder) -> Vec<String> {
    let mut violations = Vec::new();
    if !(order.output_quantity.is_finite() && order.output_quantity > 0.0) {
        violations.push("output quantity must be greater than zero".to_string());
    }
    if order.components.is_empty() {
        violations.push("at least one component is required".to_string());
    }
    for line in &order.components {
        if !(line.quantity.is_finite() && line.quantity > 0.0) {
            violations.push(format!(
                "component {} quantity must be greater than zero",
                line.product_id
            ));
        }
        if line.product_id == order.finished_product_id {
            violations.push("finished product cannot be one of its own components".to_string());
        }
    }
    violations.dedup();
    violations
}

/// Sum requested quantity per distinct component, preserving first-seen order.
fn merge_components(components: &[ComponentLine]) -> Vec<(ProductId, f64)> {
    let mut order: Vec<ProductId> = Vec::new();
    let mut totals: HashMap<ProductId, f64> = HashMap::new();
    for line in components {
        if !totals.contains_key(&line.product_id) {
            order.push(line.product_id);
        }
        *totals.entry(line.product_id).or_insert(0.0) += line.quantity;
    }
    order
        .into_iter()
        .map(|id| {
            let total = totals.get(&id).copied().unwrap_or(0.0);
            (id, total)
        })
        .collect()
}

/// Orchestrates component consumption plus finished-good production as one
/// logical unit with compensating rollback.
///
/// Not a database transaction: a crash between consumption and production
/// leaves consumption applied without compensation. Cancellation mid-saga
/// likewise leaves already-applied steps applied; only explicit step failures
/// trigger the unwind.
#[derive(Clone)]
pub struct ManufacturingSaga {
    ledger: StockLedger,
    adjust: AdjustmentService,
}

impl ManufacturingSaga {
    pub fn new(ledger: StockLedger, adjust: AdjustmentService) -> Self {
        Self { ledger, adjust }
    }

    #[instrument(
        skip(self, order),
        fields(finished = %order.finished_product_id, components = order.components.len()),
        err
    )]
    pub async fn execute(
        &self,
        user: UserId,
        order: &ManufacturingOrder,
    ) -> StockResult<ManufacturingSummary> {
        let violations = validate(order);
        if !violations.is_empty() {
            return Err(StockError::invalid_order(violations));
        }

        let merged = merge_components(&order.components);

        // One batched read covers existence, tracking flags, and the
        // quantities used by the pre-check.
        let mut wanted: Vec<ProductId> = merged.iter().map(|(id, _)| *id).collect();
        wanted.push(order.finished_product_id);
        let found = self.ledger.read_many(user, &wanted).await?;
        let by_id: HashMap<ProductId, ProductStock> =
            found.into_iter().map(|p| (p.id, p)).collect();

        let missing: Vec<ProductId> = wanted
            .iter()
            .copied()
            .filter(|id| !by_id.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(StockError::product_not_found(missing));
        }

        let finished = &by_id[&order.finished_product_id];
        if !finished.track_stock {
            return Err(StockError::untracked(finished.id, finished.name.clone()));
        }

        // Pre-check every tracked component and report every shortfall, so
        // the caller can fix all of them in one round-trip.
        let shortfalls: Vec<Shortfall> = merged
            .iter()
            .filter_map(|(id, required)| {
                let product = &by_id[id];
                if product.track_stock && product.quantity < *required {
                    Some(Shortfall {
                        product_id: *id,
                        name: product.name.clone(),
                        available: product.quantity,
                        requested: *required,
                    })
                } else {
                    None
                }
            })
            .collect();
        if !shortfalls.is_empty() {
            return Err(StockError::insufficient(shortfalls));
        }

        let note = order.notes.as_deref().unwrap_or("manufacturing order");

        let mut applied = CompensationStack::new();
        for (component_id, required) in &merged {
            match self.adjust.adjust(user, *component_id, -required, note).await {
                Ok(adjustment) => {
                    if adjustment.mechanism != Mechanism::SkippedUntracked {
                        applied.record(AppliedStep {
                            product_id: *component_id,
                            delta: adjustment.delta,
                            prior: adjustment.prior,
                        });
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        component = %component_id,
                        error = %err,
                        "component consumption failed; compensating applied steps"
                    );
                    applied.unwind(&self.adjust, user, "rollback").await;
                    return Err(err);
                }
            }
        }

        if let Err(err) = self
            .adjust
            .adjust(user, order.finished_product_id, order.output_quantity, note)
            .await
        {
            tracing::warn!(
                finished = %order.finished_product_id,
                error = %err,
                "production failed; compensating all consumed components"
            );
            applied.unwind(&self.adjust, user, "rollback").await;
            return Err(err);
        }

        let summary = ManufacturingSummary {
            finished_product_id: finished.id,
            finished_product_name: finished.name.clone(),
            output_quantity: order.output_quantity,
            output_unit: order.output_unit.clone(),
            components_count: merged.len(),
        };
        tracing::info!(
            finished = %summary.finished_product_id,
            output = summary.output_quantity,
            components = summary.components_count,
            "manufacturing order completed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use stockbook_schema::SchemaAdapter;
    use stockbook_store::{InMemoryStockStore, ProductSeed, StockStore};

    struct Fixture {
        store: Arc<InMemoryStockStore>,
        saga: ManufacturingSaga,
        user: UserId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStockStore::new());
        let dyn_store = Arc::clone(&store) as Arc<dyn StockStore>;
        let schema = Arc::new(SchemaAdapter::new(Arc::clone(&dyn_store)));
        let ledger = StockLedger::new(Arc::clone(&dyn_store), schema);
        let adjust = AdjustmentService::new(dyn_store, ledger.clone());
        Fixture {
            store,
            saga: ManufacturingSaga::new(ledger, adjust),
            user: UserId::new(),
        }
    }

    impl Fixture {
        fn seed(&self, name: &str, qty: f64) -> ProductId {
            let id = ProductId::new();
            self.store.insert_product(
                ProductSeed::new(id, name)
                    .owned_by(self.user)
                    .with_stock_quantity(qty),
            );
            id
        }

        fn qty(&self, id: ProductId) -> f64 {
            self.store.stored_quantity(id, "stock_quantity").unwrap()
        }
    }

    fn order(finished: ProductId, output: f64, components: &[(ProductId, f64)]) -> ManufacturingOrder {
        ManufacturingOrder {
            finished_product_id: finished,
            output_quantity: output,
            output_unit: None,
            components: components
                .iter()
                .map(|(id, qty)| ComponentLine {
                    product_id: *id,
                    quantity: *qty,
                    unit: None,
                })
                .collect(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn consumes_components_and_produces_output() {
        let f = fixture();
        let x = f.seed("x", 5.0);
        let y = f.seed("y", 0.0);

        let summary = f
            .saga
            .execute(f.user, &order(y, 1.0, &[(x, 5.0)]))
            .await
            .unwrap();

        assert_eq!(summary.finished_product_name, "y");
        assert_eq!(summary.components_count, 1);
        assert_eq!(f.qty(x), 0.0);
        assert_eq!(f.qty(y), 1.0);
    }

    #[tokio::test]
    async fn insufficient_component_rejects_without_mutation() {
        let f = fixture();
        let x = f.seed("x", 3.0);
        let y = f.seed("y", 0.0);

        let err = f
            .saga
            .execute(f.user, &order(y, 1.0, &[(x, 5.0)]))
            .await
            .unwrap_err();

        match err {
            StockError::InsufficientStock { shortfalls } => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].available, 3.0);
                assert_eq!(shortfalls[0].requested, 5.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(f.qty(x), 3.0);
        assert_eq!(f.qty(y), 0.0);
    }

    #[tokio::test]
    async fn precheck_reports_every_shortfall() {
        let f = fixture();
        let x = f.seed("x", 1.0);
        let z = f.seed("z", 2.0);
        let y = f.seed("y", 0.0);

        let err = f
            .saga
            .execute(f.user, &order(y, 1.0, &[(x, 5.0), (z, 5.0)]))
            .await
            .unwrap_err();

        match err {
            StockError::InsufficientStock { shortfalls } => {
                assert_eq!(shortfalls.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn production_failure_restores_all_components() {
        let f = fixture();
        let x = f.seed("x", 10.0);
        let z = f.seed("z", 10.0);
        let y = f.seed("y", 0.0);
        f.store.inject_adjust_failure(y);

        let err = f
            .saga
            .execute(f.user, &order(y, 1.0, &[(x, 4.0), (z, 2.0)]))
            .await
            .unwrap_err();

        assert!(matches!(err, StockError::Store { .. }));
        assert_eq!(f.qty(x), 10.0);
        assert_eq!(f.qty(z), 10.0);
        assert_eq!(f.qty(y), 0.0);
    }

    #[tokio::test]
    async fn self_component_rejected_before_any_store_access() {
        let f = fixture();
        let y = ProductId::new();

        let err = f
            .saga
            .execute(f.user, &order(y, 1.0, &[(y, 2.0)]))
            .await
            .unwrap_err();

        assert!(matches!(err, StockError::InvalidOrder { .. }));
        assert_eq!(f.store.probe_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_component_lines_are_merged() {
        let f = fixture();
        let x = f.seed("x", 10.0);
        let y = f.seed("y", 0.0);

        let summary = f
            .saga
            .execute(f.user, &order(y, 2.0, &[(x, 3.0), (x, 4.0)]))
            .await
            .unwrap();

        assert_eq!(summary.components_count, 1);
        assert_eq!(f.qty(x), 3.0);
        assert_eq!(f.qty(y), 2.0);
    }

    #[tokio::test]
    async fn missing_products_are_all_reported() {
        let f = fixture();
        let ghost_a = ProductId::new();
        let ghost_b = ProductId::new();
        let y = f.seed("y", 0.0);

        let err = f
            .saga
            .execute(f.user, &order(y, 1.0, &[(ghost_a, 1.0), (ghost_b, 1.0)]))
            .await
            .unwrap_err();

        match err {
            StockError::ProductNotFound { missing } => {
                assert_eq!(missing.len(), 2);
                assert!(missing.contains(&ghost_a));
                assert!(missing.contains(&ghost_b));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn untracked_finished_product_is_rejected() {
        let f = fixture();
        let x = f.seed("x", 5.0);
        let y = ProductId::new();
        f.store.insert_product(
            ProductSeed::new(y, "service-bundle")
                .owned_by(f.user)
                .untracked(),
        );

        let err = f
            .saga
            .execute(f.user, &order(y, 1.0, &[(x, 1.0)]))
            .await
            .unwrap_err();

        assert!(matches!(err, StockError::UntrackedProduct { .. }));
        assert_eq!(f.qty(x), 5.0);
    }

    #[tokio::test]
    async fn untracked_component_is_exempt_from_check_and_mutation() {
        let f = fixture();
        let x = f.seed("x", 5.0);
        let water = ProductId::new();
        f.store.insert_product(
            ProductSeed::new(water, "water")
                .owned_by(f.user)
                .untracked(),
        );
        let y = f.seed("y", 0.0);

        let summary = f
            .saga
            .execute(f.user, &order(y, 1.0, &[(x, 2.0), (water, 100.0)]))
            .await
            .unwrap();

        assert_eq!(summary.components_count, 2);
        assert_eq!(f.qty(x), 3.0);
        assert_eq!(f.qty(y), 1.0);
    }

    #[tokio::test]
    async fn empty_components_and_zero_output_report_all_violations() {
        let f = fixture();
        let y = ProductId::new();

        let err = f
            .saga
            .execute(
                f.user,
                &ManufacturingOrder {
                    finished_product_id: y,
                    output_quantity: 0.0,
                    output_unit: None,
                    components: Vec::new(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        match err {
            StockError::InvalidOrder { violations } => {
                assert_eq!(violations.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
