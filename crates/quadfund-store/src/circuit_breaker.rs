//! Circuit breaker for the primary project store
//!
//! While the hosted store keeps failing, reads skip it and go straight to the
//! fallback chain instead of waiting on request timeouts.
//!
//! ## States
//! - **Closed**: Normal operation, requests reach the primary store
//! - **Open**: Primary store skipped
//! - **HalfOpen**: Requests reach the primary store again to test recovery
//!
//! ## Transitions
//! - Closed → Open: After `failure_threshold` consecutive failures
//! - Open → HalfOpen: After `reset_timeout`
//! - HalfOpen → Closed: After `success_threshold` consecutive successes
//! - HalfOpen → Open: On any failure

use parking_lot::RwLock;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Wait before moving from Open to HalfOpen
    pub reset_timeout: Duration,
    /// Consecutive successes in HalfOpen needed to close the circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct CircuitData {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<Instant>,
}

impl CircuitData {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
        }
    }
}

/// Circuit guarding one backend.
pub struct CircuitBreaker {
    backend: &'static str,
    circuit: RwLock<CircuitData>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(backend: &'static str) -> Self {
        Self::with_config(backend, CircuitBreakerConfig::default())
    }

    pub fn with_config(backend: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            backend,
            circuit: RwLock::new(CircuitData::new()),
            config,
        }
    }

    /// Whether a request may reach the backend now.
    ///
    /// Returns `Err(CircuitOpenError)` while the circuit is open.
    pub fn check(&self) -> Result<(), CircuitOpenError> {
        let mut circuit = self.circuit.write();
        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                if let Some(last_failure) = circuit.last_failure_time {
                    if last_failure.elapsed() >= self.config.reset_timeout {
                        info!(backend = self.backend, "Circuit transitioning from Open to HalfOpen");
                        circuit.state = CircuitState::HalfOpen;
                        circuit.success_count = 0;
                        return Ok(());
                    }
                }
                Err(CircuitOpenError {
                    backend: self.backend,
                    time_until_retry: circuit
                        .last_failure_time
                        .map(|t| self.config.reset_timeout.saturating_sub(t.elapsed())),
                })
            }
        }
    }

    pub fn record_success(&self) {
        let mut circuit = self.circuit.write();
        match circuit.state {
            CircuitState::Closed | CircuitState::Open => {
                circuit.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                circuit.success_count += 1;
                if circuit.success_count >= self.config.success_threshold {
                    info!(
                        backend = self.backend,
                        successes = circuit.success_count,
                        "Circuit transitioning from HalfOpen to Closed"
                    );
                    circuit.state = CircuitState::Closed;
                    circuit.failure_count = 0;
                    circuit.success_count = 0;
                } else {
                    debug!(
                        backend = self.backend,
                        successes = circuit.success_count,
                        threshold = self.config.success_threshold,
                        "HalfOpen circuit: success recorded"
                    );
                }
            }
        }
    }

    pub fn record_failure(&self) {
        let mut circuit = self.circuit.write();
        circuit.last_failure_time = Some(Instant::now());

        match circuit.state {
            CircuitState::Closed => {
                circuit.failure_count += 1;
                if circuit.failure_count >= self.config.failure_threshold {
                    warn!(
                        backend = self.backend,
                        failures = circuit.failure_count,
                        "Circuit transitioning from Closed to Open"
                    );
                    circuit.state = CircuitState::Open;
                } else {
                    debug!(
                        backend = self.backend,
                        failures = circuit.failure_count,
                        threshold = self.config.failure_threshold,
                        "Closed circuit: failure recorded"
                    );
                }
            }
            CircuitState::HalfOpen => {
                warn!(
                    backend = self.backend,
                    "Circuit transitioning from HalfOpen to Open (failure during test)"
                );
                circuit.state = CircuitState::Open;
                circuit.success_count = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.circuit.read().state
    }

    /// Back to Closed, e.g. after the store was fixed by hand.
    pub fn reset(&self) {
        let mut circuit = self.circuit.write();
        info!(
            backend = self.backend,
            previous_state = ?circuit.state,
            "Circuit manually reset to Closed"
        );
        *circuit = CircuitData::new();
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("circuit open for {backend} store{}", retry_hint(.time_until_retry))]
pub struct CircuitOpenError {
    pub backend: &'static str,
    pub time_until_retry: Option<Duration>,
}

fn retry_hint(time_until_retry: &Option<Duration>) -> String {
    match time_until_retry {
        Some(duration) => format!(": retry in {:.1}s", duration.as_secs_f64()),
        None => String::new(),
    }
}
