//! Picking the wallet that signs a vote
//!
//! Only wallets that can sign and execute are considered. When the connected
//! account is known, the wallet holding it wins. Ties are reported, never
//! broken by guessing.

use quadfund_core::wallets_match;
use serde::{Deserialize, Serialize};

pub const SIGN_AND_EXECUTE_FEATURE: &str = "sui:signAndExecuteTransactionBlock";

/// What a browser wallet advertises through the wallet standard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDescriptor {
    pub name: String,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl WalletDescriptor {
    pub fn can_sign(&self) -> bool {
        self.features.iter().any(|f| f == SIGN_AND_EXECUTE_FEATURE)
    }

    pub fn holds(&self, account: &str) -> bool {
        self.accounts.iter().any(|a| wallets_match(a, account))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletDiscovery {
    Found(WalletDescriptor),
    NotFound,
    /// Several wallets qualify; names in registration order
    Ambiguous(Vec<String>),
}

fn pick(mut wallets: Vec<&WalletDescriptor>) -> WalletDiscovery {
    match wallets.len() {
        0 => WalletDiscovery::NotFound,
        1 => WalletDiscovery::Found(wallets.remove(0).clone()),
        _ => WalletDiscovery::Ambiguous(wallets.iter().map(|w| w.name.clone()).collect()),
    }
}

pub fn discover_wallet(wallets: &[WalletDescriptor], account: Option<&str>) -> WalletDiscovery {
    let capable: Vec<&WalletDescriptor> = wallets.iter().filter(|w| w.can_sign()).collect();

    if let Some(account) = account.filter(|a| !a.trim().is_empty()) {
        let holding: Vec<&WalletDescriptor> =
            capable.iter().copied().filter(|w| w.holds(account)).collect();
        if !holding.is_empty() {
            return pick(holding);
        }
    }
    pick(capable)
}
