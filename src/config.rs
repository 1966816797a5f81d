//! Breaker configuration.
//!
//! All types derive Serde traits for deserialization from config files.
//! A breaker's configuration is fixed at construction; nothing here is
//! mutated at runtime.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ConfigError;

/// Tuning knobs for a single circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures tolerated while closed before the circuit opens.
    pub failure_threshold: u32,

    /// Consecutive probe successes required while half-open to close again.
    pub success_threshold: u32,

    /// Minimum time the circuit stays open before a probe is admitted.
    pub reset_timeout_ms: u64,

    /// Deadline for any single wrapped operation.
    pub call_timeout_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout_ms: 30_000,
            call_timeout_ms: 30_000,
        }
    }
}

impl BreakerConfig {
    /// Reset timeout as a [`Duration`].
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    /// Per-call timeout as a [`Duration`].
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Semantic validation. Returns all violations, not just the first.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.failure_threshold == 0 {
            errors.push(ConfigError {
                field: "failure_threshold",
                problem: "must be at least 1",
            });
        }
        if self.success_threshold == 0 {
            errors.push(ConfigError {
                field: "success_threshold",
                problem: "must be at least 1",
            });
        }
        if self.reset_timeout_ms == 0 {
            errors.push(ConfigError {
                field: "reset_timeout_ms",
                problem: "must be greater than 0",
            });
        }
        if self.call_timeout_ms == 0 {
            errors.push(ConfigError {
                field: "call_timeout_ms",
                problem: "must be greater than 0",
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
