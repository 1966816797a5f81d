//! Error types for the circuit breaker.
//!
//! # Design Decisions
//! - Callers see exactly one error per protected call
//! - `Open` and `Timeout` are worth retrying later; operation failures may not be
//! - Every variant carries the breaker name so log lines need no extra lookup

use std::time::Duration;
use thiserror::Error;

use crate::breaker::CircuitState;

/// Errors returned by [`CircuitBreaker::execute`](crate::CircuitBreaker::execute).
#[derive(Debug, Error)]
pub enum BreakerError {
    /// The breaker denied the call; the operation never ran.
    #[error("circuit '{name}' is open after {consecutive_failures} consecutive failures (state: {state})")]
    Open {
        name: String,
        state: CircuitState,
        consecutive_failures: u32,
    },

    /// The operation exceeded the per-call timeout. Counted as a failure.
    #[error("circuit '{name}': operation timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    /// The operation ran and returned an error.
    #[error("circuit '{name}': operation failed: {source}")]
    OperationFailure {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The operation panicked. The panic is contained at the breaker
    /// boundary and counted as a failure.
    #[error("circuit '{name}': operation panicked: {message}")]
    Panicked { name: String, message: String },
}

impl BreakerError {
    /// True for outcomes worth retrying once the dependency may have recovered.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Timeout { .. })
    }
}

/// A failure report could not be delivered to the reporting sink.
///
/// Swallowed and logged by the breaker; never surfaced to `execute` callers.
#[derive(Debug, Error)]
#[error("failure report not delivered: {0}")]
pub struct ReportingError(pub String);

/// A semantic problem in a [`BreakerConfig`](crate::BreakerConfig).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid breaker config: {field} {problem}")]
pub struct ConfigError {
    pub field: &'static str,
    pub problem: &'static str,
}
