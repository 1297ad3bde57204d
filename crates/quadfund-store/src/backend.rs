//! Project store abstraction
//!
//! Provides a unified interface over:
//! - Supabase (PostgREST) for deployed instances
//! - An in-process map for local development and as the secondary fallback
//!
//! ## Backend Selection (Priority Order)
//!
//! 1. `STORE_BACKEND=memory|supabase` -> that backend, no questions asked
//! 2. `DEVELOPMENT_MODE=true` -> in-memory store
//! 3. Supabase URL and key configured -> Supabase with in-memory fallback
//! 4. Otherwise -> in-memory store, with warnings
//!
//! Whatever is selected is wrapped in a [`FallbackStore`], which owns the
//! degraded-mode read and write policy.

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::error::StoreError;
use crate::fallback::FallbackStore;
use crate::supabase::SupabaseStore;
use async_trait::async_trait;
use quadfund_core::{Project, ProjectId, ProjectStatus};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Which projects a listing returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectFilter {
    All,
    Approved,
    /// Owned by this wallet, compared in normalised form
    Wallet(String),
}

/// Storage for the single `projects` collection.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Short backend name used in logs and health output
    fn backend_tag(&self) -> &'static str;

    async fn insert(&self, project: Project) -> Result<Project, StoreError>;

    async fn get(&self, id: &ProjectId) -> Result<Option<Project>, StoreError>;

    /// Matching projects, newest first
    async fn list(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError>;

    /// Returns the updated project, `None` when the id is unknown
    async fn set_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, StoreError>;

    /// Adds `delta` to the vote total in a single store-side operation.
    /// Returns the new total, `None` when the id is unknown.
    async fn increment_votes(&self, id: &ProjectId, delta: u64) -> Result<Option<u64>, StoreError>;

    async fn set_wallet(&self, id: &ProjectId, wallet_address: &str) -> Result<bool, StoreError>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: &ProjectId) -> Result<bool, StoreError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendChoice {
    #[default]
    Auto,
    Supabase,
    Memory,
}

impl FromStr for BackendChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(BackendChoice::Auto),
            "supabase" => Ok(BackendChoice::Supabase),
            "memory" => Ok(BackendChoice::Memory),
            other => Err(format!(
                "unknown store backend '{}', expected auto, supabase or memory",
                other
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: BackendChoice,
    pub supabase_url: Option<String>,
    /// Service role key if available, anon key otherwise
    pub supabase_key: Option<String>,
    pub development_mode: bool,
    pub request_timeout: Duration,
    pub breaker: CircuitBreakerConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::Auto,
            supabase_url: None,
            supabase_key: None,
            development_mode: false,
            request_timeout: Duration::from_secs(10),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl StoreConfig {
    fn supabase_credentials(&self) -> Option<(&str, &str)> {
        let url = self.supabase_url.as_deref().filter(|u| !u.trim().is_empty())?;
        let key = self.supabase_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some((url, key))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Supabase,
    Memory,
}

/// Picks the primary backend following the priority order above.
pub fn select_backend_mode(config: &StoreConfig) -> BackendMode {
    match config.backend {
        BackendChoice::Supabase => BackendMode::Supabase,
        BackendChoice::Memory => BackendMode::Memory,
        BackendChoice::Auto if config.development_mode => BackendMode::Memory,
        BackendChoice::Auto if config.supabase_credentials().is_some() => BackendMode::Supabase,
        BackendChoice::Auto => BackendMode::Memory,
    }
}

/// Builds the store the server runs on.
pub fn create_store(config: &StoreConfig) -> anyhow::Result<FallbackStore> {
    match select_backend_mode(config) {
        BackendMode::Supabase => {
            let (url, key) = config.supabase_credentials().ok_or_else(|| {
                anyhow::anyhow!(
                    "Supabase backend selected but SUPABASE_URL and SUPABASE_ANON_KEY \
                     (or SUPABASE_SERVICE_ROLE_KEY) are not both set"
                )
            })?;
            let supabase = SupabaseStore::new(url, key, config.request_timeout)?;
            info!(url = %supabase.base_url(), "Using Supabase project store with in-memory fallback");
            Ok(FallbackStore::with_primary(
                Arc::new(supabase),
                config.breaker.clone(),
            ))
        }
        BackendMode::Memory => {
            if config.development_mode || config.backend == BackendChoice::Memory {
                info!("Using in-memory project store (development)");
            } else {
                warn!("Supabase credentials missing. Projects are kept in process memory only");
                warn!("Set SUPABASE_URL and SUPABASE_ANON_KEY, or DEVELOPMENT_MODE=true to silence this");
            }
            Ok(FallbackStore::memory_only())
        }
    }
}
