//! quadfund core types
//!
//! Shared by the store, the HTTP server and the wallet client:
//! - Project / milestone model with a single lifecycle status
//! - Quadratic vote pricing (`cost(n) = n²` SUI)
//! - Submission validation with field-level messages
//! - Wallet address normalisation for legacy JSON-array encoded owners
//! - The fixed example catalogue served when no store has data

pub mod catalogue;
pub mod pricing;
pub mod project;
pub mod validation;
pub mod wallet_address;

pub use catalogue::{example_project, example_projects};
pub use pricing::*;
pub use project::*;
pub use validation::{FieldError, ProjectSubmission, ValidationErrors};
pub use wallet_address::{canonical_wallet, is_owner, normalize_wallet, wallets_match};
