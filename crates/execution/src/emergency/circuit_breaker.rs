//! Circuit breaker that halts the engine on an invariant violation.

use crate::error::SwapError;
use amm_domain::error::InvariantViolation;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed (normal operation).
    Closed,
    /// Circuit is open (operations blocked).
    Open,
}

/// Blocks every operation once state has been found inconsistent.
///
/// There is no recovery path: an open breaker stays open for the lifetime of
/// the engine.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CircuitState,
    /// Violation that opened the circuit.
    violation: Option<InvariantViolation>,
    /// Block time at which the circuit opened.
    opened_at: Option<DateTime<Utc>>,
}

impl CircuitBreaker {
    /// Creates a closed circuit breaker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            violation: None,
            opened_at: None,
        }
    }

    /// Checks if operations are allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.state == CircuitState::Closed
    }

    /// Returns `Halted` with the stored violation while the circuit is open.
    pub fn check(&self) -> Result<(), SwapError> {
        match &self.violation {
            Some(violation) if self.state == CircuitState::Open => {
                Err(SwapError::Halted(violation.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Opens the circuit. Only the first violation is kept.
    pub fn trip(&mut self, violation: InvariantViolation, at: DateTime<Utc>) {
        if self.state == CircuitState::Open {
            return;
        }
        error!(reason = %violation, block_time = %at, "Circuit breaker tripped, engine halted");
        self.violation = Some(violation);
        self.opened_at = Some(at);
        self.transition_to(CircuitState::Open);
    }

    fn transition_to(&mut self, new_state: CircuitState) {
        let old_state = self.state;
        if old_state != new_state {
            self.state = new_state;
            info!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Circuit breaker state changed"
            );
        }
    }

    /// Gets the current state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Violation that opened the circuit.
    #[must_use]
    pub fn violation(&self) -> Option<&InvariantViolation> {
        self.violation.as_ref()
    }

    /// Gets circuit breaker statistics.
    #[must_use]
    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: self.state,
            opened_at: self.opened_at,
            violation: self.violation.as_ref().map(|v| v.message().to_string()),
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for the circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    /// Current state.
    pub state: CircuitState,
    /// When circuit was opened.
    pub opened_at: Option<DateTime<Utc>>,
    /// Description of the violation that opened it.
    pub violation: Option<String>,
}
