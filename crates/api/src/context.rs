//! Caller identity extraction.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use stockbook_core::UserId;

use crate::app::errors::json_error;

/// Validated caller identity, inserted into request extensions by
/// [`require_user`].
#[derive(Debug, Clone, Copy)]
pub struct CallerContext {
    pub user_id: UserId,
}

/// Reject requests without a parseable `x-user-id` header.
pub async fn require_user(mut req: Request, next: Next) -> Response {
    let Some(raw) = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
    else {
        return json_error(StatusCode::BAD_REQUEST, "missing x-user-id header");
    };

    match raw.parse::<UserId>() {
        Ok(user_id) => {
            req.extensions_mut().insert(CallerContext { user_id });
            next.run(req).await
        }
        Err(_) => json_error(StatusCode::BAD_REQUEST, "invalid x-user-id header"),
    }
}
