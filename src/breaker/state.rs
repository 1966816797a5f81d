//! Circuit state and transition logic.
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures reach failure_threshold
//! Open → Half-Open: probe admitted after the reset timeout succeeds
//! Half-Open → Closed: consecutive probe successes reach success_threshold
//! Half-Open → Open: any probe failure
//! ```
//!
//! # Design Decisions
//! - Probe admission is not a transition; the probe's outcome drives the move
//! - A failed probe refreshes the last-failure timestamp, deferring the next probe
//! - Counters are plain fields guarded by the breaker's single lock, not atomics
//! - Totals and outcome counters are bumped in the same critical section, so
//!   `total == successful + failed + rejected` holds at every instant

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::BreakerConfig;

/// The three circuit states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Normal operation; calls pass through and failures are counted.
    Closed,
    /// Failure isolation; calls are rejected until a probe is admitted.
    Open,
    /// Recovery testing; calls pass through and successes are counted.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed state change, handed to logging and reporting after the
/// lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Mutable breaker state: the small plain struct behind the breaker's
/// reader/writer lock. Critical sections touching it stay pure counter
/// and timestamp arithmetic.
#[derive(Debug)]
pub(crate) struct BreakerCore {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub last_failure: Option<Instant>,
    pub last_success: Option<Instant>,
    pub last_state_change: Option<Instant>,
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub rejected_calls: u64,
}

impl BreakerCore {
    pub fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_failure: None,
            last_success: None,
            last_state_change: None,
            total_calls: 0,
            successful_calls: 0,
            failed_calls: 0,
            rejected_calls: 0,
        }
    }

    /// Whether a call may run right now. While open this admits a probe
    /// once the reset timeout has elapsed; admission alone never changes
    /// the state.
    pub fn can_execute(&self, config: &BreakerConfig) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                // The reset clock runs from the most recent of the last
                // failure and the entry into the open state (a forced
                // open has no failure behind it).
                let opened_at = match (self.last_failure, self.last_state_change) {
                    (Some(failure), Some(change)) => Some(failure.max(change)),
                    (failure, change) => failure.or(change),
                };
                opened_at.map_or(true, |at| at.elapsed() > config.reset_timeout())
            }
        }
    }

    /// Fold one rejected call into the totals.
    pub fn record_rejection(&mut self) {
        self.total_calls += 1;
        self.rejected_calls += 1;
    }

    /// Fold one executed call's outcome into the counters and apply the
    /// transition table.
    pub fn record_result(&mut self, success: bool, config: &BreakerConfig) -> Option<Transition> {
        self.total_calls += 1;
        if success {
            self.successful_calls += 1;
            self.last_success = Some(Instant::now());
            self.on_success(config)
        } else {
            self.failed_calls += 1;
            self.last_failure = Some(Instant::now());
            self.on_failure(config)
        }
    }

    fn on_success(&mut self, config: &BreakerConfig) -> Option<Transition> {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
                None
            }
            CircuitState::Open => {
                // An admitted probe succeeded; its success is the first
                // one counted toward closing.
                let transition = self.transition_to(CircuitState::HalfOpen);
                self.consecutive_successes = 1;
                transition
            }
            CircuitState::HalfOpen => {
                self.consecutive_successes += 1;
                if self.consecutive_successes >= config.success_threshold {
                    self.transition_to(CircuitState::Closed)
                } else {
                    None
                }
            }
        }
    }

    fn on_failure(&mut self, config: &BreakerConfig) -> Option<Transition> {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= config.failure_threshold {
                    self.transition_to(CircuitState::Open)
                } else {
                    None
                }
            }
            // A failed probe leaves the circuit open; the refreshed
            // last-failure timestamp defers the next probe.
            CircuitState::Open => None,
            CircuitState::HalfOpen => self.transition_to(CircuitState::Open),
        }
    }

    /// Move to `next` unconditionally, zeroing the counter the target
    /// state consumes. Returns `None` when already in `next`.
    pub fn transition_to(&mut self, next: CircuitState) -> Option<Transition> {
        if self.state == next {
            return None;
        }
        let transition = Transition {
            from: self.state,
            to: next,
        };
        self.state = next;
        self.last_state_change = Some(Instant::now());
        match next {
            CircuitState::Closed => self.consecutive_failures = 0,
            CircuitState::HalfOpen => self.consecutive_successes = 0,
            CircuitState::Open => {}
        }
        Some(transition)
    }

    /// Reinitialize completely: closed, counters and running totals zeroed.
    pub fn reset(&mut self) -> Option<Transition> {
        let transition = self.transition_to(CircuitState::Closed);
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        self.total_calls = 0;
        self.successful_calls = 0;
        self.failed_calls = 0;
        self.rejected_calls = 0;
        transition
    }
}
