//! Project submission and listing handlers

use crate::response::{api_error, sourced_ok, store_error, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use quadfund_core::{example_projects, is_owner, Project, ProjectId, ProjectSubmission};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

fn views(projects: &[Project]) -> serde_json::Value {
    json!(projects.iter().map(Project::view).collect::<Vec<_>>())
}

/// `POST /submit-project`, multipart form. File parts are skipped; the image
/// is referenced through the `imagePath` text field.
pub async fn submit_project(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult {
    let mut submission = ProjectSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "Malformed submission form");
        api_error(StatusCode::BAD_REQUEST, format!("Invalid form data: {}", e))
    })? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() {
            debug!(field = %name, "Skipping uploaded file part");
            continue;
        }
        let value = field.text().await.map_err(|e| {
            api_error(StatusCode::BAD_REQUEST, format!("Invalid form field {}: {}", name, e))
        })?;
        if !submission.set_field(&name, value) {
            debug!(field = %name, "Ignoring unknown form field");
        }
    }

    let new_project = submission.validate().map_err(|errors| {
        info!(errors = %errors, "Rejected project submission");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": errors.to_string(),
                "fields": errors,
            })),
        )
    })?;

    let project = new_project.into_project(ProjectId::generate(), Utc::now());
    let saved = state.store.insert(project).await.map_err(store_error)?;

    info!(
        project_id = %saved.value.id,
        title = %saved.value.title,
        source = ?saved.source,
        "Project submitted"
    );

    Ok(sourced_ok(
        json!({
            "message": "Project submitted successfully",
            "projectId": saved.value.id,
        }),
        &saved,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub id: Option<String>,
}

/// `GET /get-project?id=`
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectQuery>,
) -> ApiResult {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Project ID is required"))?;

    let found = state.store.get(&ProjectId::from(id.trim())).await;
    match &found.value {
        Some(project) => Ok(sourced_ok(json!({ "project": project.view() }), &found)),
        None => Err(api_error(StatusCode::NOT_FOUND, "Project not found")),
    }
}

/// `GET /get-approved-projects`
pub async fn get_approved_projects(State(state): State<Arc<AppState>>) -> ApiResult {
    let listing = state.store.list_approved().await;
    debug!(count = listing.value.len(), source = ?listing.source, "Listed approved projects");
    Ok(sourced_ok(json!({ "projects": views(&listing.value) }), &listing))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletQuery {
    pub wallet_address: Option<String>,
}

/// `GET /get-user-submissions?walletAddress=`
pub async fn get_user_submissions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WalletQuery>,
) -> ApiResult {
    let wallet = query
        .wallet_address
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Wallet address is required"))?;

    let listing = state.store.list_by_wallet(&wallet).await;
    debug!(wallet = %wallet, count = listing.value.len(), "Listed wallet submissions");
    Ok(sourced_ok(json!({ "projects": views(&listing.value) }), &listing))
}

/// `GET /get-fallback-projects`
pub async fn get_fallback_projects() -> ApiResult {
    Ok(Json(json!({
        "success": true,
        "projects": views(&example_projects()),
        "source": "examples",
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    pub project_id: Option<String>,
    pub wallet_address: Option<String>,
}

/// `DELETE /delete-project?projectId=&walletAddress=`. Only the owner wallet
/// may delete.
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult {
    let id = query
        .project_id
        .filter(|id| !id.trim().is_empty())
        .map(|id| ProjectId::from(id.trim()))
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Project ID is required"))?;
    let wallet = query
        .wallet_address
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Wallet address is required"))?;

    let stored = state.store.get_stored(&id).await;
    let project = match stored.value {
        Some(project) => project,
        // The owner may be sitting in the unreachable primary
        None if stored.warning.is_some() => {
            return Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Project store unavailable, try again later",
            ))
        }
        None => return Err(api_error(StatusCode::NOT_FOUND, "Project not found")),
    };

    if !is_owner(&project.wallet_address, &wallet) {
        warn!(project_id = %id, wallet = %wallet, "Delete refused: wallet does not own project");
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "Not authorized to delete this project",
        ));
    }

    let deleted = state.store.delete(&id).await.map_err(store_error)?;
    if !deleted.value {
        return Err(api_error(StatusCode::NOT_FOUND, "Project not found"));
    }

    info!(project_id = %id, "Project deleted by owner");
    Ok(sourced_ok(
        json!({ "message": "Project deleted successfully" }),
        &deleted,
    ))
}
