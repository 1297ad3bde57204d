//! In-process project store
//!
//! Used as the whole store in local development and as the secondary link of
//! the fallback chain behind Supabase.

use crate::backend::{ProjectFilter, ProjectStore};
use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use quadfund_core::{is_owner, Project, ProjectId, ProjectStatus};

#[derive(Default)]
pub struct MemoryStore {
    projects: DashMap<ProjectId, Project>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

pub(crate) fn filter_matches(filter: &ProjectFilter, project: &Project) -> bool {
    match filter {
        ProjectFilter::All => true,
        ProjectFilter::Approved => project.is_approved(),
        ProjectFilter::Wallet(wallet) => is_owner(&project.wallet_address, wallet),
    }
}

pub(crate) fn newest_first(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl ProjectStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, project: Project) -> Result<Project, StoreError> {
        self.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn get(&self, id: &ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.get(id).map(|p| p.value().clone()))
    }

    async fn list(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|entry| filter_matches(filter, entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        newest_first(&mut projects);
        Ok(projects)
    }

    async fn set_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.get_mut(id).map(|mut entry| {
            entry.status = status;
            entry.value().clone()
        }))
    }

    async fn increment_votes(&self, id: &ProjectId, delta: u64) -> Result<Option<u64>, StoreError> {
        // get_mut holds the shard write lock across the read and the write
        Ok(self.projects.get_mut(id).map(|mut entry| {
            entry.votes = entry.votes.saturating_add(delta);
            entry.votes
        }))
    }

    async fn set_wallet(&self, id: &ProjectId, wallet_address: &str) -> Result<bool, StoreError> {
        Ok(self
            .projects
            .get_mut(id)
            .map(|mut entry| entry.wallet_address = wallet_address.to_string())
            .is_some())
    }

    async fn delete(&self, id: &ProjectId) -> Result<bool, StoreError> {
        Ok(self.projects.remove(id).is_some())
    }
}
