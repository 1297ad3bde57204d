//! Wallet failure classification
//!
//! Wallets report failures as free text. Cancellation keywords are checked
//! before funding keywords: "User rejected: insufficient gas" is a cancel.

use crate::notice::Notice;
use serde::Serialize;

const CANCEL_KEYWORDS: &[&str] = &["reject", "cancel", "denied", "declined"];
const FUNDS_KEYWORDS: &[&str] = &["insufficient", "balance", "gas", "not enough", "coin"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WalletFailure {
    UserCancelled,
    /// `gas` is set when the shortfall is on the gas budget rather than the amount
    InsufficientFunds { gas: bool },
    Other { reason: String },
}

fn mentions_gas(lower: &str) -> bool {
    lower.contains("gas")
}

/// Classifies the reason a wallet gave for refusing or failing to sign.
pub fn classify(reason: &str) -> WalletFailure {
    let lower = reason.to_lowercase();
    if CANCEL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        WalletFailure::UserCancelled
    } else if FUNDS_KEYWORDS.iter().any(|k| lower.contains(k)) {
        WalletFailure::InsufficientFunds {
            gas: mentions_gas(&lower),
        }
    } else {
        WalletFailure::Other {
            reason: reason.trim().to_string(),
        }
    }
}

/// Classifies the error code of a transaction that executed but did not succeed.
pub fn classify_execution_error(code: &str) -> WalletFailure {
    let lower = code.to_lowercase();
    if mentions_gas(&lower) {
        WalletFailure::InsufficientFunds { gas: true }
    } else if lower.contains("coin") || lower.contains("balance") {
        WalletFailure::InsufficientFunds { gas: false }
    } else if code.trim().is_empty() {
        WalletFailure::Other {
            reason: "Transaction failed. Please try again or check your wallet balance.".to_string(),
        }
    } else {
        WalletFailure::Other {
            reason: format!("Transaction failed: {}", code.trim()),
        }
    }
}

impl WalletFailure {
    pub fn notice(&self) -> Notice {
        match self {
            WalletFailure::UserCancelled => Notice::info("Transaction cancelled"),
            WalletFailure::InsufficientFunds { gas: true } => Notice::error(
                "Not enough SUI to cover gas fees. Please get testnet SUI from the faucet.",
            ),
            WalletFailure::InsufficientFunds { gas: false } => {
                Notice::error("Insufficient balance. Please get testnet SUI from the faucet.")
            }
            WalletFailure::Other { reason } => Notice::error(format!("Error: {}", reason)),
        }
    }
}
