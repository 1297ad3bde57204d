use crate::payment::PaymentRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failure {
        #[serde(default)]
        error: String,
    },
}

/// What the chain reported for an executed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub digest: String,
    pub status: ExecutionStatus,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// A connected wallet able to sign and submit payments.
///
/// `Err` means nothing was executed: the user declined, the wallet could not
/// build the transaction, and so on. The error text is classified with
/// [`crate::classify::classify`].
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn name(&self) -> &str;

    async fn sign_and_execute(&self, request: &PaymentRequest) -> anyhow::Result<ExecutionResult>;
}
