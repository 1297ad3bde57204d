//! Moderation and maintenance handlers

use crate::response::{api_error, sourced_ok, store_error, ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use quadfund_core::{Project, ProjectId, ProjectStatus};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Admin-only routes: closed unless a token is configured and presented.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if state.is_admin(headers) {
        Ok(())
    } else {
        warn!(configured = state.admin_configured(), "Admin request refused");
        Err(api_error(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

/// Moderation routes: guarded only when a token is configured.
fn require_moderator(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if state.admin_configured() {
        require_admin(state, headers)
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub project_id: Option<String>,
}

async fn change_status(
    state: &AppState,
    headers: &HeaderMap,
    payload: Result<Json<StatusRequest>, JsonRejection>,
    status: ProjectStatus,
) -> ApiResult {
    require_moderator(state, headers)?;
    let Json(req) = payload.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e.body_text()))
    })?;
    let id = req
        .project_id
        .filter(|id| !id.trim().is_empty())
        .map(|id| ProjectId::from(id.trim()))
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Project ID is required"))?;

    let updated = state
        .store
        .set_status(&id, status)
        .await
        .map_err(store_error)?;
    let Some(project) = &updated.value else {
        return Err(api_error(StatusCode::NOT_FOUND, "Project not found"));
    };

    info!(project_id = %id, status = %status, source = ?updated.source, "Project status changed");
    Ok(sourced_ok(
        json!({
            "message": format!("Project {} successfully", status),
            "project": project.view(),
        }),
        &updated,
    ))
}

/// `POST /approve-project`
pub async fn approve_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult {
    change_status(&state, &headers, payload, ProjectStatus::Approved).await
}

/// `POST /reject-project`
pub async fn reject_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult {
    change_status(&state, &headers, payload, ProjectStatus::Rejected).await
}

/// `GET /admin/projects`, every stored project including pending ones.
pub async fn list_all_projects(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult {
    require_admin(&state, &headers)?;
    let listing = state.store.list_all().await;
    Ok(sourced_ok(
        json!({
            "projects": listing.value.iter().map(Project::view).collect::<Vec<_>>(),
        }),
        &listing,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceDeleteQuery {
    pub project_id: Option<String>,
}

/// `DELETE /admin/delete-project?projectId=`, no ownership check.
pub async fn force_delete_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ForceDeleteQuery>,
) -> ApiResult {
    require_admin(&state, &headers)?;
    let id = query
        .project_id
        .filter(|id| !id.trim().is_empty())
        .map(|id| ProjectId::from(id.trim()))
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Project ID is required"))?;

    let deleted = state.store.delete(&id).await.map_err(store_error)?;
    if !deleted.value {
        return Err(api_error(StatusCode::NOT_FOUND, "Project not found"));
    }

    warn!(project_id = %id, "Project force-deleted by admin");
    Ok(sourced_ok(
        json!({ "message": "Project deleted successfully" }),
        &deleted,
    ))
}

/// `POST /admin/reset-circuit`, retry the primary store without waiting for
/// the circuit's reset timeout.
pub async fn reset_circuit(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult {
    require_admin(&state, &headers)?;
    let previous = state.store.reset_circuit();
    info!(previous = ?previous, "Primary circuit reset by admin");
    Ok(Json(json!({
        "success": true,
        "previousCircuit": previous,
        "primaryCircuit": state.store.circuit_state(),
    })))
}

/// `POST /admin/fix-wallets`
pub async fn fix_wallets(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult {
    require_admin(&state, &headers)?;
    let report = state.store.fix_wallets().await.map_err(store_error)?;
    Ok(sourced_ok(
        json!({
            "message": format!(
                "Normalised {} of {} wallet addresses",
                report.value.fixed, report.value.total
            ),
            "fixed": report.value.fixed,
            "total": report.value.total,
        }),
        &report,
    ))
}
