//! The stock adjustment primitive.

use std::sync::Arc;

use tracing::instrument;

use stockbook_core::{ProductId, Shortfall, StockError, StockResult, UserId};
use stockbook_schema::is_missing_procedure;
use stockbook_store::StockStore;

use crate::stock::StockLedger;

/// How an adjustment was applied.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mechanism {
    /// Atomic server-side procedure.
    Procedure,
    /// Guarded read-modify-write fallback.
    ReadModifyWrite,
    /// The product does not track stock; nothing was validated or mutated.
    SkippedUntracked,
}

/// One applied quantity delta.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub product_id: ProductId,
    /// The delta actually applied (0 for untracked products).
    pub delta: f64,
    /// Quantity before the adjustment.
    pub prior: f64,
    pub new_quantity: f64,
    pub mechanism: Mechanism,
}

/// Applies a signed quantity delta to one product.
///
/// Primary path is the atomic `adjust_stock` procedure, which closes the
/// read-modify-write race at the store. The fallback exists only for
/// environments where that procedure was never deployed and is explicitly
/// weaker: between its read and its write another request can adjust the same
/// product and one of the two updates is lost. That limitation is inherited
/// from the system this ledger replaces; callers needing correctness under
/// concurrency must add row-level locking or a compare-and-swap as an
/// explicit enhancement.
#[derive(Clone)]
pub struct AdjustmentService {
    store: Arc<dyn StockStore>,
    ledger: StockLedger,
}

impl AdjustmentService {
    pub fn new(store: Arc<dyn StockStore>, ledger: StockLedger) -> Self {
        Self { store, ledger }
    }

    /// Apply `delta` to the product's on-hand quantity.
    ///
    /// Untracked products return a successful no-op. A semantic rejection by
    /// the procedure ("would go negative") surfaces as
    /// [`StockError::InsufficientStock`] without retry; only a missing
    /// procedure triggers the fallback.
    #[instrument(skip(self, note), err)]
    pub async fn adjust(
        &self,
        user: UserId,
        product_id: ProductId,
        delta: f64,
        note: &str,
    ) -> StockResult<Adjustment> {
        let current = self.ledger.read(user, product_id).await?;
        if !current.track_stock {
            return Ok(Adjustment {
                product_id,
                delta: 0.0,
                prior: current.quantity,
                new_quantity: current.quantity,
                mechanism: Mechanism::SkippedUntracked,
            });
        }

        match self.store.call_adjust_procedure(product_id, delta, note).await {
            Ok(outcome) if outcome.success => {
                let new_quantity = outcome.new_stock.unwrap_or(current.quantity + delta);
                Ok(Adjustment {
                    product_id,
                    delta,
                    prior: current.quantity,
                    new_quantity,
                    mechanism: Mechanism::Procedure,
                })
            }
            Ok(outcome) => {
                tracing::debug!(
                    product = %product_id,
                    message = outcome.message.as_deref().unwrap_or(""),
                    "adjustment rejected by procedure"
                );
                Err(StockError::insufficient(vec![Shortfall {
                    product_id,
                    name: current.name.clone(),
                    available: current.quantity,
                    requested: delta.abs(),
                }]))
            }
            Err(err) if is_missing_procedure(&err) => {
                tracing::warn!(
                    product = %product_id,
                    "adjust_stock procedure not deployed; using read-modify-write fallback"
                );
                self.adjust_fallback(user, current.quantity, &current.name, product_id, delta)
                    .await
            }
            Err(err) => Err(StockError::store(err.to_string())),
        }
    }

    /// Read-modify-write fallback with an explicit sufficiency guard.
    ///
    /// Not safe against concurrent adjustments to the same product (lost
    /// update); see the type-level docs.
    async fn adjust_fallback(
        &self,
        user: UserId,
        prior: f64,
        name: &str,
        product_id: ProductId,
        delta: f64,
    ) -> StockResult<Adjustment> {
        let next = prior + delta;
        if next < 0.0 {
            return Err(StockError::insufficient(vec![Shortfall {
                product_id,
                name: name.to_string(),
                available: prior,
                requested: delta.abs(),
            }]));
        }
        self.ledger.write(user, product_id, next).await?;
        Ok(Adjustment {
            product_id,
            delta,
            prior,
            new_quantity: next,
            mechanism: Mechanism::ReadModifyWrite,
        })
    }
}
