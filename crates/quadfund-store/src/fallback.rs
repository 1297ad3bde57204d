//! Degraded-mode policy around the primary store
//!
//! Reads go primary → in-process store → fixed example records, stopping at
//! the first link that answers with rows. Writes that cannot reach the primary
//! land in the in-process store and carry a warning. Nothing written to the
//! in-process store is ever copied back to the primary.

use crate::backend::{ProjectFilter, ProjectStore};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::error::StoreError;
use crate::memory::{filter_matches, MemoryStore};
use quadfund_core::{
    canonical_wallet, example_project, example_projects, Project, ProjectId, ProjectStatus,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

const WRITE_FALLBACK_WARNING: &str = "Database connection failed, using fallback storage";
const READ_MEMORY_WARNING: &str = "Primary store unavailable, showing projects held in memory";
const EMPTY_PRIMARY_WARNING: &str = "No projects in primary store, showing projects held in memory";
const EXAMPLES_WARNING: &str = "Showing example projects";

/// Which link of the chain produced a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Primary,
    Memory,
    Examples,
}

#[derive(Clone, Debug)]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
    pub warning: Option<String>,
}

impl<T> Sourced<T> {
    fn new(value: T, source: DataSource) -> Self {
        Self {
            value,
            source,
            warning: None,
        }
    }

    fn warn(value: T, source: DataSource, warning: &str) -> Self {
        Self {
            value,
            source,
            warning: Some(warning.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WalletRepair {
    pub fixed: usize,
    pub total: usize,
}

pub struct FallbackStore {
    primary: Option<Arc<dyn ProjectStore>>,
    breaker: CircuitBreaker,
    memory: MemoryStore,
}

impl FallbackStore {
    pub fn with_primary(primary: Arc<dyn ProjectStore>, breaker: CircuitBreakerConfig) -> Self {
        Self {
            breaker: CircuitBreaker::with_config(primary.backend_tag(), breaker),
            primary: Some(primary),
            memory: MemoryStore::new(),
        }
    }

    /// Development store: the in-process map is the only writable link.
    pub fn memory_only() -> Self {
        Self {
            primary: None,
            breaker: CircuitBreaker::new("memory"),
            memory: MemoryStore::new(),
        }
    }

    pub fn backend_tag(&self) -> &'static str {
        self.primary
            .as_ref()
            .map(|p| p.backend_tag())
            .unwrap_or_else(|| self.memory.backend_tag())
    }

    /// `None` when running without a primary store
    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.primary.as_ref().map(|_| self.breaker.state())
    }

    /// Closes the primary circuit so the next call tries the primary again.
    /// Returns the state it was in, `None` without a primary store.
    pub fn reset_circuit(&self) -> Option<CircuitState> {
        let previous = self.circuit_state()?;
        self.breaker.reset();
        Some(previous)
    }

    /// Source tag for values served by the in-process store
    fn memory_source(&self) -> DataSource {
        if self.primary.is_some() {
            DataSource::Memory
        } else {
            DataSource::Primary
        }
    }

    /// Runs `call` against the primary store through the circuit breaker.
    /// `None` when no primary is configured.
    async fn on_primary<T, F, Fut>(&self, op: &'static str, call: F) -> Option<Result<T, StoreError>>
    where
        F: FnOnce(Arc<dyn ProjectStore>) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let primary = self.primary.clone()?;
        if let Err(open) = self.breaker.check() {
            debug!(op, "Skipping primary store: {}", open);
            return Some(Err(StoreError::Unavailable(open.to_string())));
        }

        let result = call(primary).await;
        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(e) if e.is_outage() => {
                warn!(op, error = %e, "Primary store call failed");
                self.breaker.record_failure();
            }
            Err(_) => {}
        }
        Some(result)
    }

    async fn list_chain(&self, filter: ProjectFilter, with_examples: bool) -> Sourced<Vec<Project>> {
        let primary = self
            .on_primary("list", |store| {
                let filter = filter.clone();
                async move { store.list(&filter).await }
            })
            .await;

        let primary_failed = match primary {
            Some(Ok(projects)) if !projects.is_empty() => {
                return Sourced::new(projects, DataSource::Primary);
            }
            Some(Ok(_)) => false,
            Some(Err(_)) => true,
            None => false,
        };

        // The in-process store cannot fail
        let memory = self.memory.list(&filter).await.unwrap_or_default();
        if !memory.is_empty() {
            return match (&self.primary, primary_failed) {
                (None, _) => Sourced::new(memory, DataSource::Primary),
                (Some(_), true) => Sourced::warn(memory, DataSource::Memory, READ_MEMORY_WARNING),
                (Some(_), false) => Sourced::warn(memory, DataSource::Memory, EMPTY_PRIMARY_WARNING),
            };
        }

        if with_examples {
            let examples: Vec<Project> = example_projects()
                .into_iter()
                .filter(|p| filter_matches(&filter, p))
                .collect();
            if !examples.is_empty() {
                info!(?filter, count = examples.len(), "Serving example projects");
                return Sourced::warn(examples, DataSource::Examples, EXAMPLES_WARNING);
            }
        }

        if primary_failed {
            Sourced::warn(Vec::new(), DataSource::Memory, READ_MEMORY_WARNING)
        } else {
            Sourced::new(Vec::new(), DataSource::Primary)
        }
    }

    /// Approved projects, newest first, never failing.
    pub async fn list_approved(&self) -> Sourced<Vec<Project>> {
        self.list_chain(ProjectFilter::Approved, true).await
    }

    /// Projects owned by `wallet`, any status.
    pub async fn list_by_wallet(&self, wallet: &str) -> Sourced<Vec<Project>> {
        self.list_chain(ProjectFilter::Wallet(wallet.to_string()), true).await
    }

    /// Every stored project for admin views. Example records are not stored
    /// projects and never show up here.
    pub async fn list_all(&self) -> Sourced<Vec<Project>> {
        self.list_chain(ProjectFilter::All, false).await
    }

    /// One project by id, falling back to the example records.
    pub async fn get(&self, id: &ProjectId) -> Sourced<Option<Project>> {
        let stored = self.get_stored(id).await;
        if stored.value.is_some() {
            return stored;
        }
        match example_project(id) {
            Some(example) => Sourced::warn(Some(example), DataSource::Examples, EXAMPLES_WARNING),
            None => stored,
        }
    }

    /// One project by id from the writable links only.
    pub async fn get_stored(&self, id: &ProjectId) -> Sourced<Option<Project>> {
        let primary = self
            .on_primary("get", |store| async move { store.get(id).await })
            .await;
        let primary_failed = match primary {
            Some(Ok(Some(project))) => return Sourced::new(Some(project), DataSource::Primary),
            Some(Err(_)) => true,
            _ => false,
        };

        let memory = self.memory.get(id).await.unwrap_or_default();
        match (memory, primary_failed) {
            (Some(project), true) => {
                Sourced::warn(Some(project), DataSource::Memory, READ_MEMORY_WARNING)
            }
            (Some(project), false) => Sourced::new(Some(project), self.memory_source()),
            (None, true) => Sourced::warn(None, DataSource::Memory, READ_MEMORY_WARNING),
            (None, false) => Sourced::new(None, DataSource::Primary),
        }
    }

    pub async fn insert(&self, project: Project) -> Result<Sourced<Project>, StoreError> {
        let attempt = project.clone();
        match self
            .on_primary("insert", |store| async move { store.insert(attempt).await })
            .await
        {
            Some(Ok(saved)) => Ok(Sourced::new(saved, DataSource::Primary)),
            Some(Err(e)) if !e.is_outage() => Err(e),
            Some(Err(e)) => {
                warn!(project_id = %project.id, error = %e, "Insert fell back to in-process store");
                let saved = self.memory.insert(project).await?;
                Ok(Sourced::warn(saved, DataSource::Memory, WRITE_FALLBACK_WARNING))
            }
            None => Ok(Sourced::new(self.memory.insert(project).await?, DataSource::Primary)),
        }
    }

    /// Returns the updated project, `None` when no writable link knows the id.
    ///
    /// With the primary down, an id the in-process store does not hold may
    /// still live in the primary, so the outage error is returned instead.
    pub async fn set_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
    ) -> Result<Sourced<Option<Project>>, StoreError> {
        let primary = self
            .on_primary("set_status", |store| async move { store.set_status(id, status).await })
            .await;
        let outage = match primary {
            Some(Ok(Some(project))) => {
                self.memory.set_status(id, status).await?;
                return Ok(Sourced::new(Some(project), DataSource::Primary));
            }
            Some(Err(e)) if !e.is_outage() => return Err(e),
            Some(Err(e)) => Some(e),
            _ => None,
        };

        let updated = self.memory.set_status(id, status).await?;
        self.memory_write(id, "set_status", updated, outage)
    }

    /// Adds `delta` votes. Returns the new total, `None` when no writable link
    /// knows the id. Same outage rule as [`FallbackStore::set_status`].
    pub async fn increment_votes(
        &self,
        id: &ProjectId,
        delta: u64,
    ) -> Result<Sourced<Option<u64>>, StoreError> {
        let primary = self
            .on_primary("increment_votes", |store| async move {
                store.increment_votes(id, delta).await
            })
            .await;
        let outage = match primary {
            Some(Ok(Some(total))) => return Ok(Sourced::new(Some(total), DataSource::Primary)),
            Some(Err(e)) if !e.is_outage() => return Err(e),
            Some(Err(e)) => Some(e),
            _ => None,
        };

        let total = self.memory.increment_votes(id, delta).await?;
        self.memory_write(id, "increment_votes", total, outage)
    }

    /// Result of a write that went to the in-process store, given the primary
    /// outage (if any) that sent it there.
    fn memory_write<T>(
        &self,
        id: &ProjectId,
        op: &'static str,
        value: Option<T>,
        outage: Option<StoreError>,
    ) -> Result<Sourced<Option<T>>, StoreError> {
        match (value, outage) {
            (None, Some(e)) => {
                warn!(project_id = %id, op, error = %e, "Project unknown to the in-process store while the primary is down");
                Err(e)
            }
            (None, None) => Ok(Sourced::new(None, self.memory_source())),
            (Some(v), Some(_)) => Ok(Sourced::warn(Some(v), DataSource::Memory, WRITE_FALLBACK_WARNING)),
            (Some(v), None) => Ok(Sourced::new(Some(v), self.memory_source())),
        }
    }

    /// Hard delete from every writable link holding the id.
    ///
    /// Fails only when the primary is unreachable and the in-process store
    /// does not hold the project either.
    pub async fn delete(&self, id: &ProjectId) -> Result<Sourced<bool>, StoreError> {
        let primary = self
            .on_primary("delete", |store| async move { store.delete(id).await })
            .await;
        let from_memory = self.memory.delete(id).await?;

        match primary {
            Some(Ok(true)) => Ok(Sourced::new(true, DataSource::Primary)),
            Some(Ok(false)) => Ok(Sourced::new(from_memory, DataSource::Memory)),
            Some(Err(e)) if !e.is_outage() => Err(e),
            Some(Err(e)) if from_memory => {
                warn!(project_id = %id, error = %e, "Deleted from in-process store only");
                Ok(Sourced::warn(true, DataSource::Memory, WRITE_FALLBACK_WARNING))
            }
            Some(Err(e)) => Err(e),
            None => Ok(Sourced::new(from_memory, DataSource::Primary)),
        }
    }

    /// Rewrites stored wallet addresses into their canonical form. Owner lists
    /// keep every entry.
    pub async fn fix_wallets(&self) -> Result<Sourced<WalletRepair>, StoreError> {
        let listing = self.list_all().await;
        let total = listing.value.len();
        let mut fixed = 0;

        for project in listing.value {
            let normalized = canonical_wallet(&project.wallet_address);
            if normalized == project.wallet_address {
                continue;
            }
            let updated = match listing.source {
                DataSource::Primary if self.primary.is_some() => {
                    let wallet = normalized.clone();
                    let id = project.id.clone();
                    match self
                        .on_primary("set_wallet", |store| async move {
                            store.set_wallet(&id, &wallet).await
                        })
                        .await
                    {
                        Some(result) => result?,
                        None => false,
                    }
                }
                _ => self.memory.set_wallet(&project.id, &normalized).await?,
            };
            if updated {
                debug!(project_id = %project.id, wallet = %normalized, "Normalised wallet address");
                fixed += 1;
            }
        }

        info!(fixed, total, "Wallet address repair finished");
        Ok(Sourced {
            value: WalletRepair { fixed, total },
            source: listing.source,
            warning: listing.warning,
        })
    }
}
