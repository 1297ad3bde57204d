//! Project and milestone records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque project identifier.
///
/// Submitted projects get a UUID v4; the example catalogue uses slugs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a project. The only source of truth for approval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ProjectStatus {
    /// Boolean view kept for readers of the legacy `approved` column.
    pub fn is_approved(self) -> bool {
        matches!(self, ProjectStatus::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::Approved => "approved",
            ProjectStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Completed,
    #[default]
    Pending,
}

/// A deliverable tied to the release of part of the grant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub text: String,
    /// Unlock amount in SUI
    pub amount: f64,
    #[serde(default)]
    pub status: MilestoneStatus,
}

/// A funding proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    #[serde(rename = "projectTitle", alias = "title")]
    pub title: String,
    pub description: String,
    /// Requested grant in SUI
    pub grant_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
    /// Owner address as stored. May be a legacy JSON array string; compare
    /// through [`crate::wallet_address`] only.
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    /// Cumulative quadratic cost paid by voters, in whole SUI
    #[serde(default)]
    pub votes: u64,
}

impl Project {
    pub fn is_approved(&self) -> bool {
        self.status.is_approved()
    }

    /// JSON view carrying the derived `approved` flag next to `status`.
    pub fn view(&self) -> ProjectView<'_> {
        ProjectView {
            project: self,
            approved: self.is_approved(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectView<'a> {
    #[serde(flatten)]
    pub project: &'a Project,
    pub approved: bool,
}

/// A validated submission that has not been assigned an id yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub grant_amount: f64,
    pub github_repo: Option<String>,
    pub wallet_address: String,
    pub milestones: Vec<Milestone>,
    pub image_path: Option<String>,
}

impl NewProject {
    /// Materialise the record as it is first stored: pending, zero votes.
    pub fn into_project(self, id: ProjectId, created_at: DateTime<Utc>) -> Project {
        Project {
            id,
            title: self.title,
            description: self.description,
            grant_amount: self.grant_amount,
            github_repo: self.github_repo,
            wallet_address: self.wallet_address,
            milestones: self.milestones,
            image_path: self.image_path,
            status: ProjectStatus::Pending,
            created_at,
            votes: 0,
        }
    }
}
