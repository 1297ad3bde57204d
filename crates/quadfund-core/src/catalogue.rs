//! Fixed example projects, the last step of every read fallback chain.

use crate::project::{Project, ProjectId, ProjectStatus};
use chrono::{DateTime, NaiveDate, Utc};

const EXAMPLE_OWNER: &str = "0x1234567890abcdef";

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn example(
    id: &str,
    title: &str,
    description: &str,
    grant_amount: f64,
    created_at: DateTime<Utc>,
) -> Project {
    Project {
        id: ProjectId::from(id),
        title: title.to_string(),
        description: description.to_string(),
        grant_amount,
        github_repo: None,
        wallet_address: EXAMPLE_OWNER.to_string(),
        milestones: Vec::new(),
        image_path: Some(format!("/projects/{}.jpg", id)),
        status: ProjectStatus::Approved,
        created_at,
        votes: 0,
    }
}

/// Approved example records, newest first.
pub fn example_projects() -> Vec<Project> {
    vec![
        example(
            "questloop",
            "QuestLoop",
            "Gamified learning platform for blockchain education with interactive quests and rewards.",
            42_000.0,
            date(2023, 6, 1),
        ),
        example(
            "pixelmint",
            "PixelMint",
            "A unique NFT creation platform that allows users to create, mint, and trade pixel art NFTs on Sui.",
            35_000.0,
            date(2023, 5, 15),
        ),
        example(
            "suilens",
            "SuiLens",
            "SuiLens is a powerful analytics tool that provides insights into the Sui blockchain ecosystem.",
            50_000.0,
            date(2023, 5, 1),
        ),
    ]
}

/// Example record by id.
pub fn example_project(id: &ProjectId) -> Option<Project> {
    example_projects().into_iter().find(|p| &p.id == id)
}
