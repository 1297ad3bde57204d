//! Reporting paid votes to the quadfund service

use anyhow::{bail, Context};
use async_trait::async_trait;
use quadfund_core::ProjectId;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Adds a confirmed payment to a project's vote tally.
#[async_trait]
pub trait VoteRecorder: Send + Sync {
    /// Returns the project's new total.
    async fn record_votes(&self, project_id: &ProjectId, amount_sui: u64) -> anyhow::Result<u64>;
}

/// Calls `POST /update-votes` on a quadfund server.
pub struct HttpVoteRecorder {
    client: Client,
    base_url: String,
}

impl HttpVoteRecorder {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build tally HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VoteRecorder for HttpVoteRecorder {
    async fn record_votes(&self, project_id: &ProjectId, amount_sui: u64) -> anyhow::Result<u64> {
        let url = format!("{}/update-votes", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "projectId": project_id, "voteAmount": amount_sui }))
            .send()
            .await
            .with_context(|| format!("tally request to {} failed", url))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() || body["success"] != true {
            let reason = body["error"].as_str().unwrap_or("no error message");
            bail!("tally update rejected ({}): {}", status, reason);
        }

        if let Some(warning) = body["warning"].as_str() {
            warn!(project_id = %project_id, warning, "Tally stored in degraded mode");
        }
        let total = body["votes"]
            .as_u64()
            .context("tally response is missing the vote total")?;
        debug!(project_id = %project_id, amount_sui, total, "Tally updated");
        Ok(total)
    }
}
