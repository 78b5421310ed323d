//! Candidate-column resolution with a process-lifetime cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use stockbook_core::UserId;
use stockbook_store::{OwnerPredicate, OwnerScope, StockStore};

use crate::probe::ColumnProbe;

const OWNER_CURRENT: &str = "user_id";
const OWNER_LEGACY: &str = "owner_id";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ColumnKey {
    table: String,
    candidates: Vec<String>,
}

/// Resolves which of several candidate column names a table actually exposes.
///
/// Resolutions are cached per (table, candidate list) for the lifetime of the
/// process: the schema is assumed stable once deployed, and repeated probing
/// would turn every ledger call into several extra reads.
pub struct SchemaAdapter {
    probe: ColumnProbe,
    columns: RwLock<HashMap<ColumnKey, String>>,
    owners: RwLock<HashMap<String, OwnerPredicate>>,
}

impl SchemaAdapter {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self {
            probe: ColumnProbe::new(store),
            columns: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
        }
    }

    /// Return the first candidate the table exposes.
    ///
    /// If every candidate probes as absent, the *first* candidate is returned
    /// anyway: downstream operations then fail loudly with a clear
    /// column-not-found error instead of an opaque probe failure.
    pub async fn resolve_column(&self, table: &str, candidates: &[&str]) -> String {
        let Some(first) = candidates.first().copied() else {
            return String::new();
        };

        let key = ColumnKey {
            table: table.to_string(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        };
        if let Some(cached) = self.cached_column(&key) {
            return cached;
        }

        let mut chosen: Option<&str> = None;
        for candidate in candidates.iter().copied() {
            if self.probe.probe(table, candidate).await.usable() {
                chosen = Some(candidate);
                break;
            }
        }
        let resolved = chosen.unwrap_or(first).to_string();
        if chosen.is_none() {
            tracing::warn!(
                table,
                column = %resolved,
                "no quantity candidate found; falling back to first candidate"
            );
        }

        if let Ok(mut cache) = self.columns.write() {
            cache.insert(key, resolved.clone());
        }
        resolved
    }

    /// Determine the ownership predicate applicable to a table.
    ///
    /// Both owner columns present (including indeterminate probes, which
    /// count as present under the fail-open rule) yields the either-matches
    /// predicate; exactly one yields equality on it; neither confirmed
    /// defaults to `user_id` equality.
    pub async fn resolve_ownership(&self, table: &str) -> OwnerPredicate {
        if let Ok(cache) = self.owners.read() {
            if let Some(predicate) = cache.get(table) {
                return *predicate;
            }
        }

        // Probe the legacy column even when the current one exists; a
        // mid-migration table carrying both needs the either-predicate.
        let current = self.probe.probe(table, OWNER_CURRENT).await;
        let legacy = self.probe.probe(table, OWNER_LEGACY).await;

        let predicate = match (current.usable(), legacy.usable()) {
            (true, true) => OwnerPredicate::Either,
            (true, false) => OwnerPredicate::UserId,
            (false, true) => OwnerPredicate::OwnerId,
            (false, false) => OwnerPredicate::UserId,
        };

        if let Ok(mut cache) = self.owners.write() {
            cache.insert(table.to_string(), predicate);
        }
        predicate
    }

    /// Ownership predicate for a table, bound to a caller identity.
    pub async fn owner_scope(&self, table: &str, user: UserId) -> OwnerScope {
        OwnerScope::new(user, self.resolve_ownership(table).await)
    }

    fn cached_column(&self, key: &ColumnKey) -> Option<String> {
        self.columns.read().ok()?.get(key).cloned()
    }
}
