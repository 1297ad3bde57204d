//! End-to-end vote: price, sign, pay, tally
//!
//! The payment is the commitment. Once the chain reports success the vote
//! counts as cast even if the tally update afterwards fails; that failure is
//! logged and carried in the receipt, never turned into an error notice.

use crate::classify::{classify, classify_execution_error, WalletFailure};
use crate::config::VoteConfig;
use crate::error::WalletError;
use crate::notice::Notice;
use crate::payment::{PaymentRequest, PaymentTarget};
use crate::recorder::VoteRecorder;
use crate::session::VoteSession;
use crate::signer::{ExecutionStatus, WalletSigner};
use quadfund_core::ProjectId;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TallyUpdate {
    Recorded { total: u64 },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub digest: String,
    pub votes: u64,
    pub cost_sui: u64,
    pub tally: TallyUpdate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Paid(VoteReceipt),
    Cancelled,
    Failed(WalletFailure),
    /// The wallet never answered within the signing timeout. A late answer
    /// still executes and tallies the payment in the background.
    TimedOut,
}

impl VoteOutcome {
    pub fn is_paid(&self) -> bool {
        matches!(self, VoteOutcome::Paid(_))
    }

    pub fn notice(&self) -> Notice {
        match self {
            VoteOutcome::Paid(receipt) => {
                Notice::success(format!("Successfully voted with {} SUI!", receipt.cost_sui))
            }
            VoteOutcome::Cancelled => WalletFailure::UserCancelled.notice(),
            VoteOutcome::Failed(failure) => failure.notice(),
            VoteOutcome::TimedOut => Notice::info(
                "Wallet did not respond in time. Check your wallet before voting again.",
            ),
        }
    }
}

pub struct VoteFlow {
    signer: Arc<dyn WalletSigner>,
    recorder: Arc<dyn VoteRecorder>,
    config: VoteConfig,
}

impl VoteFlow {
    pub fn new(
        signer: Arc<dyn WalletSigner>,
        recorder: Arc<dyn VoteRecorder>,
        config: VoteConfig,
    ) -> Self {
        Self {
            signer,
            recorder,
            config,
        }
    }

    pub fn session(&self) -> VoteSession {
        VoteSession::new(self.config.signing_timeout)
    }

    /// Pays for the session's selection and returns the session to idle.
    pub async fn run(
        &self,
        session: &mut VoteSession,
        project_id: &ProjectId,
        sender: &str,
        target: PaymentTarget,
    ) -> Result<VoteOutcome, WalletError> {
        let votes = session.begin_signing()?;
        let outcome = self.cast(project_id, sender, target, votes).await;
        if let Err(e) = &outcome {
            warn!(error = %e, "Vote could not be submitted to the wallet");
        }
        session.finish(matches!(&outcome, Ok(o) if o.is_paid()));
        outcome
    }

    /// Prices `votes`, has the wallet pay, and records the tally.
    ///
    /// Signing and tallying run as one spawned task. The signing timeout only
    /// stops this call from waiting: a wallet that answers late still gets
    /// its payment recorded in the background.
    pub async fn cast(
        &self,
        project_id: &ProjectId,
        sender: &str,
        target: PaymentTarget,
        votes: u64,
    ) -> Result<VoteOutcome, WalletError> {
        let request = PaymentRequest::build(sender, target, votes, &self.config)?;
        info!(
            project_id = %project_id,
            votes,
            cost_sui = request.quote.cost_sui,
            wallet = self.signer.name(),
            "Requesting vote payment"
        );

        let mut settlement = tokio::spawn(settle(
            self.signer.clone(),
            self.recorder.clone(),
            project_id.clone(),
            request,
        ));

        match tokio::time::timeout(self.config.signing_timeout, &mut settlement).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => {
                error!(project_id = %project_id, error = %e, "Vote task aborted");
                Ok(VoteOutcome::Failed(WalletFailure::Other {
                    reason: e.to_string(),
                }))
            }
            Err(_) => {
                warn!(
                    project_id = %project_id,
                    timeout_secs = self.config.signing_timeout.as_secs(),
                    "Wallet signing timed out, payment left pending in the background"
                );
                Ok(VoteOutcome::TimedOut)
            }
        }
    }
}

async fn settle(
    signer: Arc<dyn WalletSigner>,
    recorder: Arc<dyn VoteRecorder>,
    project_id: ProjectId,
    request: PaymentRequest,
) -> VoteOutcome {
    let result = match signer.sign_and_execute(&request).await {
        Ok(result) => result,
        Err(e) => {
            return match classify(&format!("{:#}", e)) {
                WalletFailure::UserCancelled => {
                    info!(project_id = %project_id, "User cancelled the vote payment");
                    VoteOutcome::Cancelled
                }
                failure => {
                    warn!(project_id = %project_id, error = %e, ?failure, "Wallet refused the vote payment");
                    VoteOutcome::Failed(failure)
                }
            };
        }
    };

    if let ExecutionStatus::Failure { error } = &result.status {
        warn!(
            project_id = %project_id,
            digest = %result.digest,
            error = %error,
            "Vote payment executed with failure status"
        );
        return VoteOutcome::Failed(classify_execution_error(error));
    }

    let tally = match recorder
        .record_votes(&project_id, request.quote.cost_sui)
        .await
    {
        Ok(total) => TallyUpdate::Recorded { total },
        Err(e) => {
            let reason = format!("{:#}", e);
            warn!(
                project_id = %project_id,
                digest = %result.digest,
                error = %reason,
                "Payment succeeded but the tally update failed"
            );
            TallyUpdate::Failed { reason }
        }
    };

    info!(project_id = %project_id, digest = %result.digest, ?tally, "Vote cast");
    VoteOutcome::Paid(VoteReceipt {
        digest: result.digest,
        votes: request.quote.votes,
        cost_sui: request.quote.cost_sui,
        tally,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use crate::session::VotePhase;
    use crate::signer::ExecutionResult;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    enum Script {
        Succeed,
        Refuse(&'static str),
        ExecuteWithError(&'static str),
        Hang,
        SucceedAfter(Duration),
    }

    struct ScriptedSigner {
        script: Script,
        requests: Mutex<Vec<PaymentRequest>>,
    }

    impl ScriptedSigner {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl WalletSigner for ScriptedSigner {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn sign_and_execute(&self, request: &PaymentRequest) -> anyhow::Result<ExecutionResult> {
            self.requests.lock().push(request.clone());
            match self.script {
                Script::Succeed => Ok(ExecutionResult {
                    digest: "9xDigest".to_string(),
                    status: ExecutionStatus::Success,
                }),
                Script::Refuse(reason) => Err(anyhow::anyhow!(reason)),
                Script::ExecuteWithError(code) => Ok(ExecutionResult {
                    digest: "9xFailed".to_string(),
                    status: ExecutionStatus::Failure {
                        error: code.to_string(),
                    },
                }),
                Script::Hang => std::future::pending().await,
                Script::SucceedAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(ExecutionResult {
                        digest: "9xLate".to_string(),
                        status: ExecutionStatus::Success,
                    })
                }
            }
        }
    }

    #[derive(Default)]
    struct Tally {
        fail: bool,
        calls: Mutex<Vec<(ProjectId, u64)>>,
    }

    #[async_trait]
    impl VoteRecorder for Tally {
        async fn record_votes(&self, project_id: &ProjectId, amount_sui: u64) -> anyhow::Result<u64> {
            if self.fail {
                anyhow::bail!("tally update rejected (503): store down");
            }
            let mut calls = self.calls.lock();
            calls.push((project_id.clone(), amount_sui));
            Ok(calls.iter().map(|(_, a)| a).sum())
        }
    }

    fn target() -> PaymentTarget {
        PaymentTarget::Transfer {
            recipient: "0xowner".to_string(),
        }
    }

    fn flow(signer: Arc<ScriptedSigner>, tally: Arc<Tally>) -> VoteFlow {
        VoteFlow::new(signer, tally, VoteConfig::default())
    }

    #[tokio::test]
    async fn test_paid_vote_records_quadratic_cost() {
        let signer = ScriptedSigner::new(Script::Succeed);
        let tally = Arc::new(Tally::default());
        let flow = flow(signer.clone(), tally.clone());

        let outcome = flow
            .cast(&ProjectId::from("p1"), "0xvoter", target(), 4)
            .await
            .unwrap();

        let VoteOutcome::Paid(receipt) = &outcome else {
            panic!("unexpected {outcome:?}");
        };
        assert_eq!(receipt.cost_sui, 16);
        assert_eq!(receipt.tally, TallyUpdate::Recorded { total: 16 });
        assert_eq!(outcome.notice().level, NoticeLevel::Success);
        assert_eq!(signer.requests.lock()[0].amount_mist(), 16_000_000_000);
        assert_eq!(tally.calls.lock()[0], (ProjectId::from("p1"), 16));
    }

    #[tokio::test]
    async fn test_cancel_leaves_tally_untouched() {
        let tally = Arc::new(Tally::default());
        let flow = flow(ScriptedSigner::new(Script::Refuse("User rejected the request")), tally.clone());

        let outcome = flow
            .cast(&ProjectId::from("p1"), "0xvoter", target(), 2)
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::Cancelled);
        assert_eq!(outcome.notice().level, NoticeLevel::Info);
        assert_eq!(outcome.notice().message, "Transaction cancelled");
        assert!(tally.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_funds_is_actionable_error() {
        let tally = Arc::new(Tally::default());
        let flow = flow(
            ScriptedSigner::new(Script::Refuse("Insufficient balance to pay")),
            tally.clone(),
        );

        let outcome = flow
            .cast(&ProjectId::from("p1"), "0xvoter", target(), 2)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Failed(WalletFailure::InsufficientFunds { gas: false })
        );
        assert!(outcome.notice().is_error());
        assert!(tally.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_execution_status() {
        let tally = Arc::new(Tally::default());
        let flow = flow(ScriptedSigner::new(Script::ExecuteWithError("InsufficientGas")), tally.clone());

        let outcome = flow
            .cast(&ProjectId::from("p1"), "0xvoter", target(), 1)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Failed(WalletFailure::InsufficientFunds { gas: true })
        );
        assert!(tally.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_tally_failure_still_counts_as_paid() {
        let tally = Arc::new(Tally {
            fail: true,
            ..Default::default()
        });
        let flow = flow(ScriptedSigner::new(Script::Succeed), tally);

        let outcome = flow
            .cast(&ProjectId::from("p1"), "0xvoter", target(), 3)
            .await
            .unwrap();
        let VoteOutcome::Paid(receipt) = &outcome else {
            panic!("unexpected {outcome:?}");
        };
        assert!(matches!(receipt.tally, TallyUpdate::Failed { .. }));
        assert_eq!(outcome.notice().level, NoticeLevel::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_wallet_times_out() {
        let flow = flow(ScriptedSigner::new(Script::Hang), Arc::new(Tally::default()));
        let mut session = flow.session();
        session.open(true).unwrap();

        let outcome = flow
            .run(&mut session, &ProjectId::from("p1"), "0xvoter", target())
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::TimedOut);
        assert_eq!(session.phase(), VotePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_wallet_answer_is_still_tallied() {
        let tally = Arc::new(Tally::default());
        let flow = flow(
            ScriptedSigner::new(Script::SucceedAfter(Duration::from_secs(25))),
            tally.clone(),
        );
        let mut session = flow.session();
        session.open(true).unwrap();
        session.selector_mut().unwrap().set(3);

        let outcome = flow
            .run(&mut session, &ProjectId::from("p1"), "0xvoter", target())
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::TimedOut);
        assert_eq!(session.phase(), VotePhase::Idle);
        assert!(tally.calls.lock().is_empty());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(tally.calls.lock().as_slice(), &[(ProjectId::from("p1"), 9)]);
    }

    #[tokio::test]
    async fn test_run_resets_selector_after_payment() {
        let flow = flow(ScriptedSigner::new(Script::Succeed), Arc::new(Tally::default()));
        let mut session = flow.session();
        session.open(true).unwrap();
        session.selector_mut().unwrap().set(3);

        let outcome = flow
            .run(&mut session, &ProjectId::from("p1"), "0xvoter", target())
            .await
            .unwrap();
        assert!(outcome.is_paid());
        assert_eq!(session.phase(), VotePhase::Idle);
        assert_eq!(session.selector().votes(), 1);
    }

    #[tokio::test]
    async fn test_run_without_connection_fails_before_wallet() {
        let signer = ScriptedSigner::new(Script::Succeed);
        let flow = flow(signer.clone(), Arc::new(Tally::default()));
        let mut session = flow.session();
        session.open(true).unwrap();

        let err = flow
            .run(&mut session, &ProjectId::from("p1"), "", target())
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::NotConnected));
        assert!(signer.requests.lock().is_empty());
        assert_eq!(session.phase(), VotePhase::Idle);
    }
}
