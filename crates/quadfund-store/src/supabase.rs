//! Supabase project store
//!
//! Talks to the PostgREST interface of a Supabase project. The `projects`
//! table keeps snake_case columns and the legacy `approved` boolean, which is
//! written from `status` on every write. Vote increments go through the
//! `increment_project_votes` SQL function (see `migrations/`) so the addition
//! happens in a single statement.

use crate::backend::{ProjectFilter, ProjectStore};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quadfund_core::{
    is_owner, normalize_wallet, Milestone, MilestoneStatus, Project, ProjectId,
    ProjectStatus,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const TABLE: &str = "projects";
const INCREMENT_VOTES_FN: &str = "increment_project_votes";

pub struct SupabaseStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn fetch_values(&self, request: RequestBuilder) -> Result<Vec<serde_json::Value>, StoreError> {
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Rows touched by a single-project call. A row that does not decode is
    /// an error here, since dropping it would read as "not found".
    async fn fetch_rows(&self, request: RequestBuilder) -> Result<Vec<Project>, StoreError> {
        self.fetch_values(request)
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }

    /// Listing rows. Rows that do not decode are skipped one by one.
    async fn fetch_listing(&self, request: RequestBuilder) -> Result<Vec<Project>, StoreError> {
        let values = self.fetch_values(request).await?;
        let total = values.len();
        let projects: Vec<Project> = values
            .into_iter()
            .filter_map(|value| {
                let id = value.get("id").map(|id| id.to_string()).unwrap_or_default();
                match decode_row(value) {
                    Ok(project) => Some(project),
                    Err(e) => {
                        warn!(row_id = %id, error = %e, "Skipping undecodable project row");
                        None
                    }
                }
            })
            .collect();
        if projects.len() < total {
            debug!(kept = projects.len(), total, "Listing decoded with skipped rows");
        }
        Ok(projects)
    }
}

fn decode_row(value: serde_json::Value) -> Result<Project, StoreError> {
    serde_json::from_value::<ProjectRow>(value)
        .map_err(|e| StoreError::Decode(e.to_string()))?
        .into_project()
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Characters safe to embed in a PostgREST `ilike` pattern.
fn wallet_needle(wallet: &str) -> String {
    let normalized = normalize_wallet(wallet);
    normalized
        .strip_prefix("0x")
        .unwrap_or(&normalized)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

#[async_trait]
impl ProjectStore for SupabaseStore {
    fn backend_tag(&self) -> &'static str {
        "supabase"
    }

    async fn insert(&self, project: Project) -> Result<Project, StoreError> {
        let row = ProjectRow::from_project(&project);
        let request = self
            .request(Method::POST, self.table_url())
            .header("Prefer", "return=representation")
            .json(&[row]);
        let mut inserted = self.fetch_rows(request).await?;
        debug!(project_id = %project.id, "Inserted project into Supabase");
        // return=representation echoes the row; fall back to what we sent
        Ok(inserted.pop().unwrap_or(project))
    }

    async fn get(&self, id: &ProjectId) -> Result<Option<Project>, StoreError> {
        let request = self
            .request(Method::GET, self.table_url())
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);
        Ok(self.fetch_rows(request).await?.into_iter().next())
    }

    async fn list(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        match filter {
            ProjectFilter::All => {}
            ProjectFilter::Approved => query.push(("status", "eq.approved".to_string())),
            ProjectFilter::Wallet(wallet) => {
                let needle = wallet_needle(wallet);
                if needle.is_empty() {
                    return Ok(Vec::new());
                }
                // Coarse match server-side, exact normalised match below
                query.push(("wallet_address", format!("ilike.*{}*", needle)));
            }
        }
        let request = self.request(Method::GET, self.table_url()).query(&query);
        let projects = self.fetch_listing(request).await?;
        Ok(match filter {
            ProjectFilter::Wallet(wallet) => projects
                .into_iter()
                .filter(|p| is_owner(&p.wallet_address, wallet))
                .collect(),
            _ => projects,
        })
    }

    async fn set_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, StoreError> {
        let request = self
            .request(Method::PATCH, self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&StatusPatch {
                status: status.as_str(),
                approved: status.is_approved(),
            });
        Ok(self.fetch_rows(request).await?.into_iter().next())
    }

    async fn increment_votes(&self, id: &ProjectId, delta: u64) -> Result<Option<u64>, StoreError> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, INCREMENT_VOTES_FN);
        let response = self
            .request(Method::POST, url)
            .json(&serde_json::json!({ "project_id": id.as_str(), "delta": delta }))
            .send()
            .await?;
        let value: serde_json::Value = check(response).await?.json().await?;
        match value {
            serde_json::Value::Null => Ok(None),
            other => votes_from_json(&other)
                .map(Some)
                .ok_or_else(|| StoreError::Decode(format!("unexpected vote total: {}", other))),
        }
    }

    async fn set_wallet(&self, id: &ProjectId, wallet_address: &str) -> Result<bool, StoreError> {
        let request = self
            .request(Method::PATCH, self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "wallet_address": wallet_address }));
        Ok(!self.fetch_rows(request).await?.is_empty())
    }

    async fn delete(&self, id: &ProjectId) -> Result<bool, StoreError> {
        let request = self
            .request(Method::DELETE, self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");
        Ok(!self.fetch_rows(request).await?.is_empty())
    }
}

#[derive(Serialize)]
struct StatusPatch {
    status: &'static str,
    approved: bool,
}

/// Row shape of the `projects` table.
#[derive(Debug, Serialize, Deserialize)]
struct ProjectRow {
    id: String,
    project_title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    grant_amount: Option<serde_json::Value>,
    #[serde(default)]
    github_repo: Option<String>,
    #[serde(default)]
    wallet_address: Option<String>,
    #[serde(default)]
    milestones: Option<serde_json::Value>,
    #[serde(default)]
    image_path: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    approved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    votes: Option<serde_json::Value>,
}

impl ProjectRow {
    fn from_project(project: &Project) -> Self {
        Self {
            id: project.id.to_string(),
            project_title: project.title.clone(),
            description: Some(project.description.clone()),
            grant_amount: Some(serde_json::json!(project.grant_amount)),
            github_repo: project.github_repo.clone(),
            wallet_address: Some(project.wallet_address.clone()),
            milestones: Some(serde_json::json!(project.milestones)),
            image_path: project.image_path.clone(),
            status: Some(project.status.as_str().to_string()),
            approved: Some(project.is_approved()),
            created_at: Some(project.created_at),
            votes: Some(serde_json::json!(project.votes)),
        }
    }

    fn into_project(self) -> Result<Project, StoreError> {
        // status wins over the legacy boolean when both are present
        let status = match self.status.as_deref() {
            Some("approved") => ProjectStatus::Approved,
            Some("rejected") => ProjectStatus::Rejected,
            Some("pending") => ProjectStatus::Pending,
            Some(other) => {
                return Err(StoreError::Decode(format!(
                    "project {} has unknown status '{}'",
                    self.id, other
                )))
            }
            None if self.approved == Some(true) => ProjectStatus::Approved,
            None => ProjectStatus::Pending,
        };
        if self.status.is_some() && self.approved.is_some() && self.approved != Some(status.is_approved()) {
            warn!(
                project_id = %self.id,
                status = %status,
                approved = ?self.approved,
                "Row has inconsistent status/approved columns, using status"
            );
        }

        let milestones = self
            .milestones
            .as_ref()
            .map(|value| milestones_from_json(&self.id, value))
            .unwrap_or_default();

        Ok(Project {
            id: ProjectId::from(self.id),
            title: self.project_title,
            description: self.description.unwrap_or_default(),
            grant_amount: self.grant_amount.as_ref().and_then(number_from_json).unwrap_or(0.0),
            github_repo: self.github_repo.filter(|r| !r.is_empty()),
            wallet_address: self.wallet_address.unwrap_or_default(),
            milestones,
            image_path: self.image_path.filter(|p| !p.is_empty()),
            status,
            created_at: self.created_at.unwrap_or_default(),
            votes: self.votes.as_ref().and_then(votes_from_json).unwrap_or(0),
        })
    }
}

fn number_from_json(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn votes_from_json(value: &serde_json::Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| number_from_json(value).filter(|v| *v >= 0.0).map(|v| v as u64))
}

/// Milestones as written by older clients: `{text|description, amount|unlockAmount}`.
fn milestones_from_json(project_id: &str, value: &serde_json::Value) -> Vec<Milestone> {
    let Some(items) = value.as_array() else {
        warn!(project_id, "Milestones column is not an array, ignoring");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let text = item
                .get("text")
                .or_else(|| item.get("description"))
                .and_then(|t| t.as_str())?
                .to_string();
            let amount = item
                .get("amount")
                .or_else(|| item.get("unlockAmount"))
                .and_then(number_from_json)
                .unwrap_or(0.0);
            let status = match item.get("status").and_then(|s| s.as_str()) {
                Some("completed") => MilestoneStatus::Completed,
                _ => MilestoneStatus::Pending,
            };
            Some(Milestone {
                text,
                amount,
                status,
            })
        })
        .collect()
}
