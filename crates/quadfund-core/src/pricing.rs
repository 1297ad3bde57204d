//! Quadratic vote pricing
//!
//! Casting `n` votes costs `n²` SUI, charged in MIST (10⁹ MIST per SUI).
//! This prices one voter's repeated votes; there is no matching pool and no
//! aggregation across voters beyond summing what was paid.

use serde::{Deserialize, Serialize};

/// Smallest-unit multiplier of the Sui chain (9 decimals).
pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Lowest vote count the selector accepts.
pub const MIN_VOTES: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("vote count must be at least {MIN_VOTES}")]
    BelowMinimum,
    #[error("cost of {votes} votes overflows the MIST range")]
    Overflow { votes: u64 },
}

/// Cost of `votes` votes in whole SUI.
pub fn quadratic_cost(votes: u64) -> Result<u64, PricingError> {
    if votes < MIN_VOTES {
        return Err(PricingError::BelowMinimum);
    }
    votes
        .checked_mul(votes)
        .ok_or(PricingError::Overflow { votes })
}

/// Whole SUI to MIST.
pub fn sui_to_mist(sui: u64) -> Option<u64> {
    sui.checked_mul(MIST_PER_SUI)
}

/// Price of a vote selection in both units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteQuote {
    pub votes: u64,
    pub cost_sui: u64,
    pub cost_mist: u64,
}

impl VoteQuote {
    pub fn for_votes(votes: u64) -> Result<Self, PricingError> {
        let cost_sui = quadratic_cost(votes)?;
        let cost_mist = sui_to_mist(cost_sui).ok_or(PricingError::Overflow { votes })?;
        Ok(Self {
            votes,
            cost_sui,
            cost_mist,
        })
    }
}
