use std::time::Duration;

pub const DEFAULT_GAS_BUDGET_MIST: u64 = 5_000_000;
pub const DEFAULT_CHAIN: &str = "sui:testnet";
pub const DEFAULT_SIGNING_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone, Debug)]
pub struct VoteConfig {
    pub gas_budget_mist: u64,
    /// Wallet-standard chain id passed to the signer
    pub chain: String,
    /// How long the vote may wait on the wallet before it is forced back to idle
    pub signing_timeout: Duration,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            gas_budget_mist: DEFAULT_GAS_BUDGET_MIST,
            chain: DEFAULT_CHAIN.to_string(),
            signing_timeout: DEFAULT_SIGNING_TIMEOUT,
        }
    }
}
