//! `stockbook-ledger` — the stock ledger and its multi-step adjustment saga.
//!
//! Layering, leaf-first:
//!
//! - [`StockLedger`]: reads/writes one product's on-hand quantity through the
//!   schema adapter, normalizing to a non-negative number. The dual-column
//!   migration shim and the tracking capability gate live here and nowhere
//!   else.
//! - [`AdjustmentService`]: applies one signed delta, preferring the atomic
//!   server-side procedure and falling back to a guarded read-modify-write
//!   only when the procedure was never deployed.
//! - [`ManufacturingSaga`]: consumes N components and produces one finished
//!   good as a single logical unit, with a typed compensation stack replayed
//!   in reverse on failure.
//! - [`SalesStockSync`] / [`PurchaseStockSync`]: thin lifecycle callers for
//!   sales and restocking purchases.
//!
//! This is a saga, not a distributed transaction: no two-phase commit, no
//! write-ahead log, no cross-request locking. Compensations are best-effort
//! forward operations, and the read-modify-write fallback can lose updates
//! under concurrent adjustments to the same product (see
//! [`AdjustmentService::adjust`]).

pub mod adjust;
pub mod manufacturing;
pub mod saga;
pub mod stock;
pub mod sync;

pub use adjust::{Adjustment, AdjustmentService, Mechanism};
pub use manufacturing::{
    ComponentLine, ManufacturingOrder, ManufacturingSaga, ManufacturingSummary,
};
pub use saga::{AppliedStep, CompensationStack};
pub use stock::{ProductStock, StockLedger};
pub use sync::{
    ExpenseCategory, PurchaseItem, PurchaseStockSync, SaleItem, SalesStockSync, SyncReport,
};
