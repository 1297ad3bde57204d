//! Client side of casting a quadratic vote
//!
//! The UI drives a [`VoteSession`] (selector, signing, safety timeout) and
//! hands the selection to a [`VoteFlow`], which builds the payment, lets the
//! connected [`WalletSigner`] execute it and reports the paid amount through
//! a [`VoteRecorder`]. Every outcome maps to one [`Notice`] for the user.

pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod flow;
pub mod notice;
pub mod payment;
pub mod recorder;
pub mod selector;
pub mod session;
pub mod signer;

pub use classify::{classify, classify_execution_error, WalletFailure};
pub use config::VoteConfig;
pub use discovery::{discover_wallet, WalletDescriptor, WalletDiscovery};
pub use error::WalletError;
pub use flow::{TallyUpdate, VoteFlow, VoteOutcome, VoteReceipt};
pub use notice::{Notice, NoticeLevel};
pub use payment::{PaymentRequest, PaymentTarget};
pub use recorder::{HttpVoteRecorder, VoteRecorder};
pub use selector::VoteSelector;
pub use session::{VotePhase, VoteSession};
pub use signer::{ExecutionResult, ExecutionStatus, WalletSigner};
