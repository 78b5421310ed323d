use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use crate::app::{AppServices, dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new().route("/stock/adjust", post(adjust_stock))
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let note = body.note.as_deref().unwrap_or("manual adjustment");

    match services
        .adjustments
        .adjust(caller.user_id, body.product_id, body.delta, note)
        .await
    {
        Ok(adjustment) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "productId": adjustment.product_id,
                    "newQuantity": adjustment.new_quantity,
                },
            })),
        )
            .into_response(),
        Err(err) => errors::stock_error_to_response(err),
    }
}
