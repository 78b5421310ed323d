//! Wire DTOs.

use serde::{Deserialize, Serialize};

use stockbook_core::ProductId;
use stockbook_ledger::{
    ComponentLine, ExpenseCategory, ManufacturingOrder, ManufacturingSummary, PurchaseItem,
    SaleItem, SyncReport,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRequest {
    pub product_id: ProductId,
    pub qty: f64,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingOrderRequest {
    pub finished_product_id: ProductId,
    pub output_qty: f64,
    pub output_unit: Option<String>,
    pub components: Vec<ComponentRequest>,
    pub notes: Option<String>,
}

impl From<ManufacturingOrderRequest> for ManufacturingOrder {
    fn from(req: ManufacturingOrderRequest) -> Self {
        Self {
            finished_product_id: req.finished_product_id,
            output_quantity: req.output_qty,
            output_unit: req.output_unit,
            components: req
                .components
                .into_iter()
                .map(|c| ComponentLine {
                    product_id: c.product_id,
                    quantity: c.qty,
                    unit: c.unit,
                })
                .collect(),
            notes: req.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub product_id: ProductId,
    pub delta: f64,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub product_id: ProductId,
    pub qty: f64,
}

#[derive(Debug, Deserialize)]
pub struct SaleSyncRequest {
    pub items: Vec<SaleItemRequest>,
}

impl SaleSyncRequest {
    pub fn items(&self) -> Vec<SaleItem> {
        self.items
            .iter()
            .map(|i| SaleItem {
                product_id: i.product_id,
                quantity: i.qty,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct PurchaseSyncRequest {
    pub items: Vec<SaleItemRequest>,
    pub category: ExpenseCategory,
}

impl PurchaseSyncRequest {
    pub fn items(&self) -> Vec<PurchaseItem> {
        self.items
            .iter()
            .map(|i| PurchaseItem {
                product_id: i.product_id,
                quantity: i.qty,
            })
            .collect()
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingData {
    pub finished_product_id: ProductId,
    pub finished_product_name: String,
    pub output_qty: f64,
    pub output_unit: Option<String>,
    pub components_count: usize,
}

impl From<ManufacturingSummary> for ManufacturingData {
    fn from(summary: ManufacturingSummary) -> Self {
        Self {
            finished_product_id: summary.finished_product_id,
            finished_product_name: summary.finished_product_name,
            output_qty: summary.output_quantity,
            output_unit: summary.output_unit,
            components_count: summary.components_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailureData {
    pub product_id: ProductId,
    pub error: String,
}

/// Stock sync is best-effort: the triggering record stands either way, and
/// failures are surfaced here for the caller to log/alert on.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncData {
    pub attempted: usize,
    pub failures: Vec<SyncFailureData>,
}

impl From<SyncReport> for SyncData {
    fn from(report: SyncReport) -> Self {
        Self {
            attempted: report.outcomes().len(),
            failures: report
                .failures()
                .map(|(product_id, err)| SyncFailureData {
                    product_id: *product_id,
                    error: err.to_string(),
                })
                .collect(),
        }
    }
}
