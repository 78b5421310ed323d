use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use stockbook_ledger::ManufacturingOrder;

use crate::app::{AppServices, dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new().route("/manufacturing-orders", post(create_manufacturing_order))
}

pub async fn create_manufacturing_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::ManufacturingOrderRequest>,
) -> axum::response::Response {
    let order = ManufacturingOrder::from(body);

    match services.manufacturing.execute(caller.user_id, &order).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": dto::ManufacturingData::from(summary),
            })),
        )
            .into_response(),
        Err(err) => errors::stock_error_to_response(err),
    }
}
