//! Application state

use axum::http::{header, HeaderMap};
use quadfund_store::FallbackStore;

pub struct AppState {
    pub store: FallbackStore,
    /// Bearer token for admin routes. Without one the admin-only routes are
    /// closed and approval stays open.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(store: FallbackStore, admin_token: Option<String>) -> Self {
        Self {
            store,
            admin_token: admin_token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn admin_configured(&self) -> bool {
        self.admin_token.is_some()
    }

    /// Whether the request carries the configured admin token.
    pub fn is_admin(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.admin_token.as_deref() else {
            return false;
        };
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| token.trim() == expected)
            .unwrap_or(false)
    }
}
