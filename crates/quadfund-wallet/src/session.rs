//! Vote button state
//!
//! `Idle → Selecting → AwaitingWallet → Idle`. A session stuck waiting on the
//! wallet for longer than the signing timeout is forced back to idle by
//! [`VoteSession::expire_if_stuck`].

use crate::error::WalletError;
use crate::selector::VoteSelector;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VotePhase {
    Idle,
    Selecting,
    AwaitingWallet,
}

#[derive(Debug)]
enum State {
    Idle,
    Selecting,
    AwaitingWallet { since: Instant, votes: u64 },
}

#[derive(Debug)]
pub struct VoteSession {
    state: State,
    selector: VoteSelector,
    signing_timeout: Duration,
}

impl VoteSession {
    pub fn new(signing_timeout: Duration) -> Self {
        Self {
            state: State::Idle,
            selector: VoteSelector::new(),
            signing_timeout,
        }
    }

    pub fn phase(&self) -> VotePhase {
        match self.state {
            State::Idle => VotePhase::Idle,
            State::Selecting => VotePhase::Selecting,
            State::AwaitingWallet { .. } => VotePhase::AwaitingWallet,
        }
    }

    pub fn selector(&self) -> &VoteSelector {
        &self.selector
    }

    /// The selector can only be changed while it is shown.
    pub fn selector_mut(&mut self) -> Result<&mut VoteSelector, WalletError> {
        match self.state {
            State::Selecting => Ok(&mut self.selector),
            State::Idle => Err(WalletError::SelectorClosed),
            State::AwaitingWallet { .. } => Err(WalletError::Busy),
        }
    }

    /// Shows the selector. Requires a connected account.
    pub fn open(&mut self, connected: bool) -> Result<(), WalletError> {
        if !connected {
            return Err(WalletError::NotConnected);
        }
        match self.state {
            State::AwaitingWallet { .. } => Err(WalletError::Busy),
            _ => {
                self.state = State::Selecting;
                Ok(())
            }
        }
    }

    /// Hides the selector and forgets the selection. Ignored while signing.
    pub fn cancel(&mut self) {
        if let State::Selecting = self.state {
            self.state = State::Idle;
            self.selector.reset();
        }
    }

    /// Locks in the selection; returns the vote count to pay for.
    pub fn begin_signing(&mut self) -> Result<u64, WalletError> {
        match self.state {
            State::Selecting => {
                let votes = self.selector.votes();
                self.state = State::AwaitingWallet {
                    since: Instant::now(),
                    votes,
                };
                debug!(votes, "Waiting on wallet signature");
                Ok(votes)
            }
            State::Idle => Err(WalletError::SelectorClosed),
            State::AwaitingWallet { .. } => Err(WalletError::Busy),
        }
    }

    /// Back to idle once the wallet answered. The selection survives a failed
    /// payment so the user can retry it.
    pub fn finish(&mut self, paid: bool) {
        self.state = State::Idle;
        if paid {
            self.selector.reset();
        }
    }

    /// Forces a session that waited on the wallet past the signing timeout
    /// back to idle. Returns whether it did.
    pub fn expire_if_stuck(&mut self) -> bool {
        let State::AwaitingWallet { since, votes } = self.state else {
            return false;
        };
        if since.elapsed() < self.signing_timeout {
            return false;
        }
        warn!(
            votes,
            waited_secs = since.elapsed().as_secs(),
            "Wallet never answered, resetting vote session"
        );
        self.reset();
        true
    }

    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.selector.reset();
    }
}
