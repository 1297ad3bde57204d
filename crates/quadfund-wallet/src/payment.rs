//! Payment requests handed to the wallet for signing
//!
//! A vote pays its quadratic cost either straight to the project owner or
//! into the donation contract. The amount is split off the gas coin.

use crate::config::VoteConfig;
use crate::error::WalletError;
use quadfund_core::VoteQuote;
use serde::Serialize;

pub const DONATION_MODULE: &str = "quadfund_donation";
pub const DONATION_FUNCTION: &str = "donate";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaymentTarget {
    /// Transfer the split coin to `recipient`
    #[serde(rename_all = "camelCase")]
    Transfer { recipient: String },
    /// `<package>::quadfund_donation::donate(project_object, coin)`
    #[serde(rename_all = "camelCase")]
    Donation {
        package_id: String,
        project_object: String,
    },
}

impl PaymentTarget {
    /// Fully qualified Move function for contract payments.
    pub fn move_target(&self) -> Option<String> {
        match self {
            PaymentTarget::Transfer { .. } => None,
            PaymentTarget::Donation { package_id, .. } => Some(format!(
                "{}::{}::{}",
                package_id, DONATION_MODULE, DONATION_FUNCTION
            )),
        }
    }

    fn check(&self) -> Result<(), WalletError> {
        match self {
            PaymentTarget::Transfer { recipient } if recipient.trim().is_empty() => {
                Err(WalletError::InvalidTarget("recipient"))
            }
            PaymentTarget::Donation { package_id, .. } if package_id.trim().is_empty() => {
                Err(WalletError::InvalidTarget("package id"))
            }
            PaymentTarget::Donation { project_object, .. } if project_object.trim().is_empty() => {
                Err(WalletError::InvalidTarget("project object"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub sender: String,
    pub target: PaymentTarget,
    pub quote: VoteQuote,
    pub gas_budget_mist: u64,
    pub chain: String,
}

impl PaymentRequest {
    pub fn build(
        sender: &str,
        target: PaymentTarget,
        votes: u64,
        config: &VoteConfig,
    ) -> Result<Self, WalletError> {
        if sender.trim().is_empty() {
            return Err(WalletError::NotConnected);
        }
        target.check()?;
        Ok(Self {
            sender: sender.trim().to_string(),
            target,
            quote: VoteQuote::for_votes(votes)?,
            gas_budget_mist: config.gas_budget_mist,
            chain: config.chain.clone(),
        })
    }

    pub fn amount_mist(&self) -> u64 {
        self.quote.cost_mist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadfund_core::PricingError;

    fn transfer() -> PaymentTarget {
        PaymentTarget::Transfer {
            recipient: "0x01ca".to_string(),
        }
    }

    #[test]
    fn test_build_prices_votes_quadratically() {
        let request = PaymentRequest::build("0xsender", transfer(), 3, &VoteConfig::default()).unwrap();
        assert_eq!(request.quote.cost_sui, 9);
        assert_eq!(request.amount_mist(), 9_000_000_000);
        assert_eq!(request.gas_budget_mist, 5_000_000);
        assert_eq!(request.chain, "sui:testnet");
    }

    #[test]
    fn test_build_requires_sender() {
        let err = PaymentRequest::build(" ", transfer(), 1, &VoteConfig::default()).unwrap_err();
        assert!(matches!(err, WalletError::NotConnected));
    }

    #[test]
    fn test_build_rejects_empty_target() {
        let target = PaymentTarget::Transfer {
            recipient: String::new(),
        };
        let err = PaymentRequest::build("0xsender", target, 1, &VoteConfig::default()).unwrap_err();
        assert!(matches!(err, WalletError::InvalidTarget("recipient")));
    }

    #[test]
    fn test_build_reports_overflow() {
        let err = PaymentRequest::build("0xsender", transfer(), 200_000, &VoteConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            WalletError::Pricing(PricingError::Overflow { votes: 200_000 })
        ));
    }

    #[test]
    fn test_donation_move_target() {
        let target = PaymentTarget::Donation {
            package_id: "0x9141".to_string(),
            project_object: "0x436c".to_string(),
        };
        assert_eq!(
            target.move_target().as_deref(),
            Some("0x9141::quadfund_donation::donate")
        );
        assert_eq!(transfer().move_target(), None);
    }

    #[test]
    fn test_serialized_shape() {
        let request = PaymentRequest::build("0xsender", transfer(), 2, &VoteConfig::default()).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["target"]["kind"], "transfer");
        assert_eq!(json["target"]["recipient"], "0x01ca");
        assert_eq!(json["quote"]["costMist"], 4_000_000_000u64);
        assert_eq!(json["gasBudgetMist"], 5_000_000);
    }
}
