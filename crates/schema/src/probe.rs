//! Column existence probing.

use std::sync::Arc;

use stockbook_store::StockStore;

use crate::signals;

/// Result of probing one (table, column) pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Exists,
    Absent,
    /// The probe failed for a reason unrelated to schema shape (permission,
    /// network, syntax). Callers must treat this the same as [`Exists`]:
    /// failing open avoids masking a real outage as schema drift.
    Indeterminate,
}

impl ProbeOutcome {
    /// Whether the column should be used, under the fail-open rule.
    pub fn usable(self) -> bool {
        !matches!(self, ProbeOutcome::Absent)
    }
}

/// Issues a minimal single-column read and classifies the outcome.
#[derive(Clone)]
pub struct ColumnProbe {
    store: Arc<dyn StockStore>,
}

impl ColumnProbe {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self { store }
    }

    pub async fn probe(&self, table: &str, column: &str) -> ProbeOutcome {
        match self.store.probe_column(table, column).await {
            Ok(()) => ProbeOutcome::Exists,
            Err(err) if signals::is_missing_column(&err) => {
                tracing::debug!(table, column, "column probe: absent");
                ProbeOutcome::Absent
            }
            Err(err) => {
                tracing::warn!(table, column, error = %err, "column probe indeterminate; assuming present");
                ProbeOutcome::Indeterminate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockbook_store::InMemoryStockStore;

    #[tokio::test]
    async fn classifies_present_absent_and_indeterminate() {
        let store = Arc::new(InMemoryStockStore::new());
        let probe = ColumnProbe::new(store);

        assert_eq!(
            probe.probe("products", "stock_quantity").await,
            ProbeOutcome::Exists
        );
        assert_eq!(probe.probe("products", "stock").await, ProbeOutcome::Absent);
        // Unknown relation errors are not column signatures.
        assert_eq!(
            probe.probe("ghost_table", "stock").await,
            ProbeOutcome::Indeterminate
        );
        assert!(ProbeOutcome::Indeterminate.usable());
    }
}
