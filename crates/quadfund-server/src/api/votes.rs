//! Vote tally handler

use crate::response::{api_error, sourced_ok, store_error, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use quadfund_core::ProjectId;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVotesRequest {
    pub project_id: Option<String>,
    /// SUI paid for the votes, i.e. the quadratic cost
    pub vote_amount: Option<Value>,
}

/// Largest amount the store's `BIGINT` vote column can take in one step.
const MAX_VOTE_AMOUNT: u64 = i64::MAX as u64;

/// Positive whole number up to [`MAX_VOTE_AMOUNT`], as a JSON number or an
/// integral float.
fn vote_amount(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|v| v.is_finite() && v.fract() == 0.0 && *v < MAX_VOTE_AMOUNT as f64)
                .map(|v| v as u64)
        })
        .filter(|v| (1..=MAX_VOTE_AMOUNT).contains(v))
}

/// `POST /update-votes`, called once the wallet reports a successful payment.
pub async fn update_votes(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateVotesRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e.body_text()))
    })?;

    let id = req
        .project_id
        .filter(|id| !id.trim().is_empty())
        .map(|id| ProjectId::from(id.trim()))
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Project ID is required"))?;
    let delta = req
        .vote_amount
        .as_ref()
        .and_then(vote_amount)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Valid vote amount is required"))?;

    let updated = state
        .store
        .increment_votes(&id, delta)
        .await
        .map_err(store_error)?;

    match updated.value {
        Some(total) => {
            info!(project_id = %id, delta, total, source = ?updated.source, "Votes recorded");
            Ok(sourced_ok(
                json!({ "message": "Votes updated successfully", "votes": total }),
                &updated,
            ))
        }
        None => {
            warn!(project_id = %id, delta, "Vote for unknown project");
            Err(api_error(StatusCode::NOT_FOUND, "Project not found"))
        }
    }
}
