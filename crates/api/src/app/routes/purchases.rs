use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{delete, post},
};

use stockbook_core::ExpenseId;

use crate::app::routes::sales::sync_response;
use crate::app::{AppServices, dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/purchases/recorded", post(purchase_recorded))
        .route("/purchases/:expense_id/stock", delete(purchase_deleted))
}

pub async fn purchase_recorded(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::PurchaseSyncRequest>,
) -> axum::response::Response {
    let report = services
        .purchases
        .on_purchase_recorded(caller.user_id, &body.items(), body.category)
        .await;
    sync_response(report)
}

pub async fn purchase_deleted(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(expense_id): Path<String>,
) -> axum::response::Response {
    let expense_id: ExpenseId = match expense_id.parse() {
        Ok(id) => id,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid expense id"),
    };

    match services
        .purchases
        .on_purchase_deleted(caller.user_id, expense_id)
        .await
    {
        Ok(report) => sync_response(report),
        Err(err) => errors::stock_error_to_response(err),
    }
}
