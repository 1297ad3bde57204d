//! Vote count selector

use quadfund_core::{PricingError, VoteQuote, MIN_VOTES};

/// Number of votes the user is about to buy. Never below one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteSelector {
    votes: u64,
}

impl Default for VoteSelector {
    fn default() -> Self {
        Self { votes: MIN_VOTES }
    }
}

impl VoteSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn votes(&self) -> u64 {
        self.votes
    }

    pub fn increment(&mut self) {
        self.votes = self.votes.saturating_add(1);
    }

    /// No-op at the minimum.
    pub fn decrement(&mut self) {
        self.votes = self.votes.saturating_sub(1).max(MIN_VOTES);
    }

    pub fn set(&mut self, votes: u64) {
        self.votes = votes.max(MIN_VOTES);
    }

    pub fn reset(&mut self) {
        self.votes = MIN_VOTES;
    }

    /// Cost of the current selection.
    pub fn quote(&self) -> Result<VoteQuote, PricingError> {
        VoteQuote::for_votes(self.votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_one() {
        let selector = VoteSelector::new();
        assert_eq!(selector.votes(), 1);
        assert_eq!(selector.quote().unwrap().cost_sui, 1);
    }

    #[test]
    fn test_decrement_at_minimum_is_noop() {
        let mut selector = VoteSelector::new();
        selector.decrement();
        assert_eq!(selector.votes(), 1);

        selector.increment();
        selector.increment();
        selector.decrement();
        assert_eq!(selector.votes(), 2);
    }

    #[test]
    fn test_set_clamps_to_minimum() {
        let mut selector = VoteSelector::new();
        selector.set(0);
        assert_eq!(selector.votes(), 1);
        selector.set(4);
        assert_eq!(selector.quote().unwrap().cost_sui, 16);
    }

    #[test]
    fn test_quote_reports_overflow() {
        let mut selector = VoteSelector::new();
        selector.set(u64::MAX);
        assert!(selector.quote().is_err());
    }
}
