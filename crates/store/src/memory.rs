//! In-memory stock store.
//!
//! Intended for tests/dev. Not optimized for performance. Schema drift is
//! simulated by configuring which columns a table exposes; reads and writes
//! against unconfigured columns fail with the same SQLSTATE a real Postgres
//! would report, so the probe/fallback machinery can be exercised without a
//! database.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use stockbook_core::{ExpenseId, ProductId, UserId, normalize_quantity};

use crate::error::StoreError;
use crate::r#trait::StockStore;
use crate::types::{ExpenseItemRecord, OwnerScope, ProcedureOutcome, ProductRecord};

const UNDEFINED_COLUMN: &str = "42703";
const UNDEFINED_FUNCTION: &str = "42883";
const UNDEFINED_TABLE: &str = "42P01";

/// Seed row for the in-memory store, builder-style.
#[derive(Debug, Clone)]
pub struct ProductSeed {
    pub id: ProductId,
    pub name: String,
    pub user_id: Option<UserId>,
    pub owner_id: Option<UserId>,
    pub stock_quantity: Option<f64>,
    pub stock: Option<f64>,
    pub track_stock: bool,
}

impl ProductSeed {
    pub fn new(id: ProductId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            user_id: None,
            owner_id: None,
            stock_quantity: None,
            stock: None,
            track_stock: true,
        }
    }

    pub fn owned_by(mut self, user: UserId) -> Self {
        self.user_id = Some(user);
        self
    }

    pub fn legacy_owned_by(mut self, user: UserId) -> Self {
        self.owner_id = Some(user);
        self
    }

    pub fn with_stock_quantity(mut self, qty: f64) -> Self {
        self.stock_quantity = Some(qty);
        self
    }

    pub fn with_stock(mut self, qty: f64) -> Self {
        self.stock = Some(qty);
        self
    }

    pub fn untracked(mut self) -> Self {
        self.track_stock = false;
        self
    }
}

#[derive(Debug, Clone)]
struct ExpenseItemRow {
    expense_id: ExpenseId,
    product_id: ProductId,
    quantity: f64,
    user_id: Option<UserId>,
    owner_id: Option<UserId>,
}

#[derive(Debug, Default)]
struct State {
    /// table name -> columns that "exist" in this simulated deployment.
    columns: HashMap<String, HashSet<String>>,
    products: HashMap<ProductId, ProductSeed>,
    expense_items: Vec<ExpenseItemRow>,
    procedure_available: bool,
    fail_adjust: HashSet<ProductId>,
    fail_update: HashSet<ProductId>,
    probes: Vec<(String, String)>,
}

/// In-memory [`StockStore`] with configurable schema drift.
#[derive(Debug)]
pub struct InMemoryStockStore {
    state: RwLock<State>,
}

impl Default for InMemoryStockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStockStore {
    /// Current-schema deployment: `stock_quantity` + `user_id`, procedure
    /// deployed.
    pub fn new() -> Self {
        let store = Self {
            state: RwLock::new(State {
                procedure_available: true,
                ..State::default()
            }),
        };
        store.set_table_columns(
            "products",
            &["id", "name", "stock_quantity", "track_stock", "user_id"],
        );
        store.set_table_columns("expense_items", &["expense_id", "product_id", "quantity", "user_id"]);
        store
    }

    /// Replace the simulated column set of a table.
    pub fn set_table_columns(&self, table: &str, columns: &[&str]) {
        let mut state = self.state.write().expect("lock poisoned");
        state.columns.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
    }

    pub fn set_procedure_available(&self, available: bool) {
        self.state.write().expect("lock poisoned").procedure_available = available;
    }

    pub fn insert_product(&self, seed: ProductSeed) {
        self.state
            .write()
            .expect("lock poisoned")
            .products
            .insert(seed.id, seed);
    }

    pub fn insert_expense_item(
        &self,
        expense_id: ExpenseId,
        product_id: ProductId,
        quantity: f64,
        user: UserId,
    ) {
        self.state
            .write()
            .expect("lock poisoned")
            .expense_items
            .push(ExpenseItemRow {
                expense_id,
                product_id,
                quantity,
                user_id: Some(user),
                owner_id: Some(user),
            });
    }

    /// Make the next (and every) procedure call and direct update for this
    /// product fail with a generic database error.
    pub fn inject_adjust_failure(&self, id: ProductId) {
        let mut state = self.state.write().expect("lock poisoned");
        state.fail_adjust.insert(id);
        state.fail_update.insert(id);
    }

    pub fn clear_injected_failures(&self) {
        let mut state = self.state.write().expect("lock poisoned");
        state.fail_adjust.clear();
        state.fail_update.clear();
    }

    /// Probes issued so far, in order. Lets tests assert cache hits.
    pub fn probes(&self) -> Vec<(String, String)> {
        self.state.read().expect("lock poisoned").probes.clone()
    }

    pub fn probe_count(&self) -> usize {
        self.state.read().expect("lock poisoned").probes.len()
    }

    /// Raw stored value of one quantity column, for assertions.
    pub fn stored_quantity(&self, id: ProductId, column: &str) -> Option<f64> {
        let state = self.state.read().expect("lock poisoned");
        let product = state.products.get(&id)?;
        match column {
            "stock_quantity" => product.stock_quantity,
            "stock" => product.stock,
            _ => None,
        }
    }

    fn ensure_column(state: &State, table: &str, column: &str) -> Result<(), StoreError> {
        let Some(cols) = state.columns.get(table) else {
            return Err(StoreError::database(
                Some(UNDEFINED_TABLE),
                format!("relation \"{table}\" does not exist"),
            ));
        };
        if cols.contains(column) {
            Ok(())
        } else {
            Err(StoreError::database(
                Some(UNDEFINED_COLUMN),
                format!("column \"{column}\" of relation \"{table}\" does not exist"),
            ))
        }
    }

    fn record_for(
        state: &State,
        scope: &OwnerScope,
        id: ProductId,
        quantity_column: &str,
    ) -> Option<ProductRecord> {
        let product = state.products.get(&id)?;
        if !scope.matches(product.user_id, product.owner_id) {
            return None;
        }
        let quantity = match quantity_column {
            "stock_quantity" => product.stock_quantity,
            "stock" => product.stock,
            _ => None,
        };
        Some(ProductRecord {
            id: product.id,
            name: product.name.clone(),
            quantity,
            track_stock: product.track_stock,
        })
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn probe_column(&self, table: &str, column: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.probes.push((table.to_string(), column.to_string()));
        Self::ensure_column(&state, table, column)
    }

    async fn fetch_product(
        &self,
        scope: &OwnerScope,
        id: ProductId,
        quantity_column: &str,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Self::ensure_column(&state, "products", quantity_column)?;
        Ok(Self::record_for(&state, scope, id, quantity_column))
    }

    async fn fetch_products(
        &self,
        scope: &OwnerScope,
        ids: &[ProductId],
        quantity_column: &str,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Self::ensure_column(&state, "products", quantity_column)?;
        Ok(ids
            .iter()
            .filter_map(|id| Self::record_for(&state, scope, *id, quantity_column))
            .collect())
    }

    async fn update_product_quantity(
        &self,
        scope: &OwnerScope,
        id: ProductId,
        column: &str,
        value: f64,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        Self::ensure_column(&state, "products", column)?;
        if state.fail_update.contains(&id) {
            return Err(StoreError::database(
                None::<String>,
                "injected update failure",
            ));
        }

        let Some(product) = state.products.get_mut(&id) else {
            return Ok(0);
        };
        if !scope.matches(product.user_id, product.owner_id) {
            return Ok(0);
        }
        match column {
            "stock_quantity" => product.stock_quantity = Some(value),
            "stock" => product.stock = Some(value),
            _ => return Ok(0),
        }
        Ok(1)
    }

    async fn call_adjust_procedure(
        &self,
        id: ProductId,
        delta: f64,
        _note: &str,
    ) -> Result<ProcedureOutcome, StoreError> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if !state.procedure_available {
            return Err(StoreError::database(
                Some(UNDEFINED_FUNCTION),
                "function adjust_stock(uuid, double precision, text) does not exist",
            ));
        }
        if state.fail_adjust.contains(&id) {
            return Err(StoreError::database(
                None::<String>,
                "injected procedure failure",
            ));
        }

        let has_stock_quantity = state
            .columns
            .get("products")
            .is_some_and(|c| c.contains("stock_quantity"));
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(ProcedureOutcome {
                success: false,
                new_stock: None,
                message: Some("product not found".to_string()),
            });
        };

        let current = normalize_quantity(if has_stock_quantity {
            product.stock_quantity
        } else {
            product.stock
        });
        let next = current + delta;
        if next < 0.0 {
            return Ok(ProcedureOutcome {
                success: false,
                new_stock: Some(current),
                message: Some("stock would go negative".to_string()),
            });
        }

        // The server-side procedure keeps every deployed quantity column in
        // sync.
        if product.stock_quantity.is_some() || has_stock_quantity {
            product.stock_quantity = Some(next);
        }
        if product.stock.is_some() {
            product.stock = Some(next);
        }
        Ok(ProcedureOutcome {
            success: true,
            new_stock: Some(next),
            message: None,
        })
    }

    async fn fetch_expense_items(
        &self,
        scope: &OwnerScope,
        expense_id: ExpenseId,
    ) -> Result<Vec<ExpenseItemRecord>, StoreError> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .expense_items
            .iter()
            .filter(|item| item.expense_id == expense_id)
            .filter(|item| scope.matches(item.user_id, item.owner_id))
            .map(|item| ExpenseItemRecord {
                expense_id: item.expense_id,
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect())
    }
}

fn lock_poisoned<T>(_: T) -> StoreError {
    StoreError::Connection("lock poisoned".to_string())
}
