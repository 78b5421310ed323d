use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use crate::app::{AppServices, dto};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/sales/recorded", post(sale_recorded))
        .route("/sales/deleted", post(sale_deleted))
}

pub async fn sale_recorded(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::SaleSyncRequest>,
) -> axum::response::Response {
    let report = services
        .sales
        .on_sale_recorded(caller.user_id, &body.items())
        .await;
    sync_response(report)
}

pub async fn sale_deleted(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::SaleSyncRequest>,
) -> axum::response::Response {
    let report = services
        .sales
        .on_sale_deleted(caller.user_id, &body.items())
        .await;
    sync_response(report)
}

/// Sync is best-effort: the HTTP call succeeds even with per-item failures,
/// which are reported in the payload for logging/alerting.
pub(super) fn sync_response(report: stockbook_ledger::SyncReport) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": dto::SyncData::from(report),
        })),
    )
        .into_response()
}
