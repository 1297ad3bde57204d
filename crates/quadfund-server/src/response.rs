//! JSON envelope helpers
//!
//! Every response is `{ "success": bool, ... }`; failures carry `error`.

use axum::http::StatusCode;
use axum::Json;
use quadfund_store::{Sourced, StoreError};
use serde_json::{json, Value};
use tracing::error;

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult = Result<Json<Value>, ApiError>;

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({ "success": false, "error": message.into() })),
    )
}

pub fn store_error(e: StoreError) -> ApiError {
    error!(error = %e, "Project store request failed");
    let status = match &e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Rejected { .. } => StatusCode::BAD_GATEWAY,
        StoreError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

/// Success body with `source` and, in degraded mode, `warning`.
pub fn sourced_ok<T>(mut body: Value, sourced: &Sourced<T>) -> Json<Value> {
    if let Some(map) = body.as_object_mut() {
        map.insert("success".to_string(), Value::Bool(true));
        map.insert("source".to_string(), json!(sourced.source));
        if let Some(warning) = &sourced.warning {
            map.insert("warning".to_string(), Value::String(warning.clone()));
        }
    }
    Json(body)
}
