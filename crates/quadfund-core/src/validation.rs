//! Project submission validation
//!
//! Form fields arrive as text (multipart). A submission is accepted only with
//! a title, a description and a positive grant amount; every milestone needs
//! text and a positive unlock amount. All violations are reported together.

use crate::project::{Milestone, MilestoneStatus, NewProject};
use crate::wallet_address::canonical_wallet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw submission as posted by the form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSubmission {
    pub project_title: Option<String>,
    pub description: Option<String>,
    pub grant_amount: Option<String>,
    pub github_repo: Option<String>,
    pub wallet_address: Option<String>,
    /// JSON array of `{ text, unlockAmount }`
    pub milestones: Option<String>,
    pub image_path: Option<String>,
}

impl ProjectSubmission {
    /// Assign a form field by name. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "projectTitle" => &mut self.project_title,
            "description" => &mut self.description,
            "grantAmount" => &mut self.grant_amount,
            "githubRepo" => &mut self.github_repo,
            "walletAddress" => &mut self.wallet_address,
            "milestones" => &mut self.milestones,
            "imagePath" => &mut self.image_path,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    pub fn validate(self) -> Result<NewProject, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = non_empty(self.project_title);
        if title.is_none() {
            errors.push("projectTitle", "Missing required field: projectTitle");
        }

        let description = non_empty(self.description);
        if description.is_none() {
            errors.push("description", "Missing required field: description");
        }

        let grant_amount = match non_empty(self.grant_amount) {
            None => {
                errors.push("grantAmount", "Missing required field: grantAmount");
                None
            }
            Some(raw) => match parse_positive(&raw) {
                Some(amount) => Some(amount),
                None => {
                    errors.push("grantAmount", "Grant amount must be a positive number");
                    None
                }
            },
        };

        let milestones = match non_empty(self.milestones) {
            None => Vec::new(),
            Some(raw) => parse_milestones(&raw, &mut errors),
        };

        match (title, description, grant_amount) {
            (Some(title), Some(description), Some(grant_amount)) if errors.is_empty() => {
                Ok(NewProject {
                    title,
                    description,
                    grant_amount,
                    github_repo: non_empty(self.github_repo),
                    wallet_address: self
                        .wallet_address
                        .map(|w| canonical_wallet(&w))
                        .unwrap_or_default(),
                    milestones,
                    image_path: non_empty(self.image_path),
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMilestone {
    #[serde(default, alias = "description")]
    text: Option<String>,
    #[serde(default, alias = "unlockAmount")]
    amount: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<MilestoneStatus>,
}

fn parse_milestones(raw: &str, errors: &mut ValidationErrors) -> Vec<Milestone> {
    let parsed: Vec<RawMilestone> = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            errors.push("milestones", format!("Milestones must be a JSON array: {}", e));
            return Vec::new();
        }
    };

    let mut milestones = Vec::with_capacity(parsed.len());
    for (index, raw) in parsed.into_iter().enumerate() {
        let text = non_empty(raw.text);
        if text.is_none() {
            errors.push(
                format!("milestones[{}].text", index),
                "Milestone description is required",
            );
        }
        let amount = raw.amount.as_ref().and_then(amount_from_json);
        if amount.is_none() {
            errors.push(
                format!("milestones[{}].unlockAmount", index),
                "Milestone unlock amount must be a positive number",
            );
        }
        if let (Some(text), Some(amount)) = (text, amount) {
            milestones.push(Milestone {
                text,
                amount,
                status: raw.status.unwrap_or_default(),
            });
        }
    }
    milestones
}

fn amount_from_json(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v > 0.0),
        serde_json::Value::String(s) => parse_positive(s),
        _ => None,
    }
}

fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field-level violation of one submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<_> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ProjectSubmission {
        ProjectSubmission {
            project_title: Some("SuiScan".to_string()),
            description: Some("Explorer for Sui".to_string()),
            grant_amount: Some("5000".to_string()),
            github_repo: Some("https://github.com/example/suiscan".to_string()),
            wallet_address: Some("[\"0xABC\"]".to_string()),
            milestones: Some(
                r#"[{"text":"Indexer","unlockAmount":"2000"},{"text":"UI","unlockAmount":3000}]"#
                    .to_string(),
            ),
            image_path: None,
        }
    }

    #[test]
    fn test_complete_submission_accepted() {
        let project = complete().validate().unwrap();
        assert_eq!(project.title, "SuiScan");
        assert_eq!(project.grant_amount, 5000.0);
        assert_eq!(project.milestones.len(), 2);
        assert_eq!(project.milestones[0].amount, 2000.0);
        assert_eq!(project.milestones[1].status, MilestoneStatus::Pending);
        assert_eq!(project.wallet_address, "0xabc");
    }

    #[test]
    fn test_missing_title_rejected() {
        let mut submission = complete();
        submission.project_title = None;
        let errors = submission.validate().unwrap_err();
        assert!(errors.has_field("projectTitle"));
    }

    #[test]
    fn test_blank_description_rejected() {
        let mut submission = complete();
        submission.description = Some("   ".to_string());
        let errors = submission.validate().unwrap_err();
        assert!(errors.has_field("description"));
    }

    #[test]
    fn test_non_positive_grant_rejected() {
        for raw in ["0", "-10", "abc", "NaN", "inf"] {
            let mut submission = complete();
            submission.grant_amount = Some(raw.to_string());
            let errors = submission.validate().unwrap_err();
            assert!(errors.has_field("grantAmount"), "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_all_missing_fields_reported_together() {
        let errors = ProjectSubmission::default().validate().unwrap_err();
        assert!(errors.has_field("projectTitle"));
        assert!(errors.has_field("description"));
        assert!(errors.has_field("grantAmount"));
        assert_eq!(errors.fields().len(), 3);
    }

    #[test]
    fn test_milestone_without_text_rejected() {
        let mut submission = complete();
        submission.milestones = Some(r#"[{"text":"","unlockAmount":"100"}]"#.to_string());
        let errors = submission.validate().unwrap_err();
        assert!(errors.has_field("milestones[0].text"));
    }

    #[test]
    fn test_milestone_without_positive_amount_rejected() {
        let mut submission = complete();
        submission.milestones = Some(
            r#"[{"text":"ok","unlockAmount":"50"},{"text":"bad","unlockAmount":""}]"#.to_string(),
        );
        let errors = submission.validate().unwrap_err();
        assert!(errors.has_field("milestones[1].unlockAmount"));
        assert!(!errors.has_field("milestones[0].unlockAmount"));
    }

    #[test]
    fn test_malformed_milestones_rejected() {
        let mut submission = complete();
        submission.milestones = Some("not json".to_string());
        let errors = submission.validate().unwrap_err();
        assert!(errors.has_field("milestones"));
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let mut submission = complete();
        submission.github_repo = Some(String::new());
        submission.milestones = None;
        submission.wallet_address = None;
        let project = submission.validate().unwrap();
        assert!(project.github_repo.is_none());
        assert!(project.milestones.is_empty());
        assert!(project.image_path.is_none());
    }

    #[test]
    fn test_set_field_maps_form_names() {
        let mut submission = ProjectSubmission::default();
        assert!(submission.set_field("projectTitle", "T".to_string()));
        assert!(submission.set_field("grantAmount", "1".to_string()));
        assert!(!submission.set_field("projectImage", "ignored".to_string()));
        assert_eq!(submission.project_title.as_deref(), Some("T"));
    }

    #[test]
    fn test_errors_display_joins_messages() {
        let errors = ProjectSubmission::default().validate().unwrap_err();
        let msg = errors.to_string();
        assert!(msg.contains("projectTitle"));
        assert!(msg.contains("; "));
    }
}
