//! Mapping from ledger errors to the wire contract.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};

use stockbook_core::StockError;

/// `{ success: false, error, meta? }` with the given status.
pub fn failure(
    status: StatusCode,
    error: impl Into<String>,
    meta: Option<Value>,
) -> axum::response::Response {
    let mut body = json!({
        "success": false,
        "error": error.into(),
    });
    if let Some(meta) = meta {
        body["meta"] = meta;
    }
    (status, Json(body)).into_response()
}

/// Plain failure envelope without meta (middleware-level rejections).
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    failure(status, message, None)
}

pub fn stock_error_to_response(err: StockError) -> axum::response::Response {
    match err {
        StockError::InvalidOrder { violations } => {
            failure(StatusCode::BAD_REQUEST, violations.join("; "), None)
        }
        StockError::ProductNotFound { missing } => failure(
            StatusCode::BAD_REQUEST,
            "product(s) not found",
            Some(json!({ "missingProductIds": missing })),
        ),
        StockError::InsufficientStock { shortfalls } => failure(
            StatusCode::BAD_REQUEST,
            "insufficient stock",
            Some(json!({ "insufficient": shortfalls })),
        ),
        err @ StockError::UntrackedProduct { .. } => {
            failure(StatusCode::BAD_REQUEST, err.to_string(), None)
        }
        StockError::InvalidId(msg) => failure(StatusCode::BAD_REQUEST, msg, None),
        // ProcedureUnavailable is an internal fallback signal; reaching here
        // means a bug, treat it as a server failure like the rest.
        err @ (StockError::SchemaMismatch { .. }
        | StockError::Store { .. }
        | StockError::ProcedureUnavailable) => {
            failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
        }
    }
}
