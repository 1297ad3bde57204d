//! Vote flow against a running quadfund server.

use async_trait::async_trait;
use chrono::Utc;
use quadfund_core::{NewProject, ProjectId};
use quadfund_server::{build_router, AppState};
use quadfund_store::FallbackStore;
use quadfund_wallet::{
    ExecutionResult, ExecutionStatus, HttpVoteRecorder, PaymentRequest, PaymentTarget,
    TallyUpdate, VoteConfig, VoteFlow, VoteOutcome, VoteRecorder, WalletSigner,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

struct ApprovingWallet;

#[async_trait]
impl WalletSigner for ApprovingWallet {
    fn name(&self) -> &str {
        "approving"
    }

    async fn sign_and_execute(&self, request: &PaymentRequest) -> anyhow::Result<ExecutionResult> {
        Ok(ExecutionResult {
            digest: format!("digest-{}", request.quote.cost_mist),
            status: ExecutionStatus::Success,
        })
    }
}

async fn spawn_server() -> (String, Arc<AppState>) {
    let state = Arc::new(AppState::new(FallbackStore::memory_only(), None));
    let project = NewProject {
        title: "Move Analyzer".to_string(),
        description: "Static analysis for Move".to_string(),
        grant_amount: 3000.0,
        github_repo: None,
        wallet_address: "0xowner".to_string(),
        milestones: Vec::new(),
        image_path: None,
    }
    .into_project(ProjectId::from("analyzer"), Utc::now());
    state.store.insert(project).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind local server");
    let addr = listener.local_addr().expect("read addr");
    let app = build_router(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve") });
    (format!("http://{}", addr), state)
}

fn target() -> PaymentTarget {
    PaymentTarget::Transfer {
        recipient: "0xowner".to_string(),
    }
}

#[tokio::test]
async fn test_votes_reach_the_server_tally() {
    let (url, state) = spawn_server().await;
    let recorder = Arc::new(HttpVoteRecorder::new(&url, Duration::from_secs(5)).unwrap());
    let flow = VoteFlow::new(Arc::new(ApprovingWallet), recorder, VoteConfig::default());
    let id = ProjectId::from("analyzer");

    let first = flow.cast(&id, "0xvoter", target(), 2).await.unwrap();
    let second = flow.cast(&id, "0xvoter", target(), 3).await.unwrap();

    let VoteOutcome::Paid(receipt) = second else {
        panic!("unexpected {second:?}");
    };
    assert!(first.is_paid());
    assert_eq!(receipt.tally, TallyUpdate::Recorded { total: 4 + 9 });

    let stored = state.store.get(&id).await.value.unwrap();
    assert_eq!(stored.votes, 13);
}

#[tokio::test]
async fn test_unknown_project_is_a_recorder_error() {
    let (url, _) = spawn_server().await;
    let recorder = HttpVoteRecorder::new(&url, Duration::from_secs(5)).unwrap();

    let err = recorder
        .record_votes(&ProjectId::from("missing"), 4)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Project not found"));
}

#[tokio::test]
async fn test_unreachable_tally_keeps_the_payment() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let recorder = Arc::new(HttpVoteRecorder::new(&dead, Duration::from_secs(2)).unwrap());
    let flow = VoteFlow::new(Arc::new(ApprovingWallet), recorder, VoteConfig::default());

    let outcome = flow
        .cast(&ProjectId::from("analyzer"), "0xvoter", target(), 1)
        .await
        .unwrap();
    let VoteOutcome::Paid(receipt) = &outcome else {
        panic!("unexpected {outcome:?}");
    };
    assert!(matches!(receipt.tally, TallyUpdate::Failed { .. }));
    assert!(!outcome.notice().is_error());
}
