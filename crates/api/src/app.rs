//! Application wiring: services and router.

use std::sync::Arc;

use axum::{Extension, Router, middleware};

use stockbook_ledger::{
    AdjustmentService, ManufacturingSaga, PurchaseStockSync, SalesStockSync, StockLedger,
};
use stockbook_schema::SchemaAdapter;
use stockbook_store::StockStore;

use crate::context;

pub mod dto;
pub mod errors;
pub mod routes;

/// The ledger service graph, shared across requests.
///
/// One [`SchemaAdapter`] per process: its column resolutions are cached for
/// the process lifetime, which is exactly the caching contract.
pub struct AppServices {
    pub adjustments: AdjustmentService,
    pub manufacturing: ManufacturingSaga,
    pub sales: SalesStockSync,
    pub purchases: PurchaseStockSync,
}

impl AppServices {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        let schema = Arc::new(SchemaAdapter::new(Arc::clone(&store)));
        let ledger = StockLedger::new(Arc::clone(&store), Arc::clone(&schema));
        let adjustments = AdjustmentService::new(Arc::clone(&store), ledger.clone());
        Self {
            manufacturing: ManufacturingSaga::new(ledger, adjustments.clone()),
            sales: SalesStockSync::new(adjustments.clone()),
            purchases: PurchaseStockSync::new(store, schema, adjustments.clone()),
            adjustments,
        }
    }
}

/// Build the full application router over a store implementation.
pub fn build_app(store: Arc<dyn StockStore>) -> Router {
    let services = Arc::new(AppServices::new(store));

    Router::new()
        .merge(routes::manufacturing::router())
        .merge(routes::stock::router())
        .merge(routes::sales::router())
        .merge(routes::purchases::router())
        .layer(middleware::from_fn(context::require_user))
        .layer(Extension(services))
}
