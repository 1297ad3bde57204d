//! quadfund HTTP API
//!
//! Routes mirror the paths the web client calls. Every response uses the
//! `{ "success": bool, ... }` envelope; reads served in degraded mode add
//! `source` and `warning`.

pub mod api;
pub mod response;
pub mod state;

pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Upper bound for submission forms, file parts included.
const MAX_FORM_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health::health))
        .route("/submit-project", post(api::projects::submit_project))
        .route("/get-project", get(api::projects::get_project))
        .route("/get-approved-projects", get(api::projects::get_approved_projects))
        .route("/get-user-submissions", get(api::projects::get_user_submissions))
        .route("/get-fallback-projects", get(api::projects::get_fallback_projects))
        .route("/delete-project", delete(api::projects::delete_project))
        .route("/update-votes", post(api::votes::update_votes))
        .route("/approve-project", post(api::admin::approve_project))
        .route("/reject-project", post(api::admin::reject_project))
        .route("/admin/projects", get(api::admin::list_all_projects))
        .route("/admin/delete-project", delete(api::admin::force_delete_project))
        .route("/admin/fix-wallets", post(api::admin::fix_wallets))
        .route("/admin/reset-circuit", post(api::admin::reset_circuit))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .with_state(state)
}
