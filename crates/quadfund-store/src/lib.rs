//! Project storage for quadfund
//!
//! `SupabaseStore` and `MemoryStore` implement [`ProjectStore`];
//! [`FallbackStore`] composes them into the read and write fallback chain the
//! server runs on.

pub mod backend;
pub mod circuit_breaker;
pub mod error;
pub mod fallback;
pub mod memory;
pub mod supabase;

pub use backend::{
    create_store, select_backend_mode, BackendChoice, BackendMode, ProjectFilter, ProjectStore,
    StoreConfig,
};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitOpenError, CircuitState};
pub use error::StoreError;
pub use fallback::{DataSource, FallbackStore, Sourced, WalletRepair};
pub use memory::MemoryStore;
pub use supabase::SupabaseStore;
