//! Circuit breaker core.
//!
//! # Data Flow
//! ```text
//! execute(operation):
//!     → admission check (state controller, write lock)
//!     → denied: record rejection, report CIRCUIT_OPEN, fail fast
//!     → admitted: spawn operation, race completion against call timeout
//!     → fold outcome into counters, apply transition table
//!     → after lock release: tracing event, metrics, failure report, listener
//! ```
//!
//! # Design Decisions
//! - One reader/writer lock around plain counters; no lock-free structures
//! - The wrapped operation always runs outside the lock
//! - A timed-out operation is abandoned, not cancelled; the runtime cannot
//!   preempt arbitrary code
//! - Probe admission is racy on purpose: concurrent callers past the reset
//!   deadline may all run as probes, and the first recorded outcome decides
//! - Panics are contained at this boundary and recorded as failures

pub mod state;
pub mod stats;

pub use state::CircuitState;
pub use stats::BreakerStats;

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::config::BreakerConfig;
use crate::errors::BreakerError;
use crate::observability::metrics;
use crate::reporting::{ErrorCode, FailureReporter, NoopReporter, ReportEntry, Severity};
use state::{BreakerCore, Transition};

/// Notification passed to the state-change listener.
#[derive(Debug, Clone)]
pub struct StateChange {
    /// Name of the breaker that transitioned.
    pub breaker: String,
    pub from: CircuitState,
    pub to: CircuitState,
    /// Short human-readable trigger, e.g. "failure threshold reached".
    pub reason: String,
}

type StateListener = Arc<dyn Fn(&StateChange) + Send + Sync>;

/// A circuit breaker protecting one downstream dependency.
///
/// All methods take `&self`; share an instance across tasks behind an
/// [`Arc`]. State lives in memory only and is scoped to this instance's
/// lifetime.
pub struct CircuitBreaker {
    id: Uuid,
    name: String,
    config: BreakerConfig,
    core: RwLock<BreakerCore>,
    reporter: Arc<dyn FailureReporter>,
    listener: RwLock<Option<StateListener>>,
}

impl CircuitBreaker {
    /// Create a breaker that keeps its failure reports to itself.
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self::with_reporter(name, config, Arc::new(NoopReporter))
    }

    /// Create a breaker wired to a failure-reporting sink.
    pub fn with_reporter(
        name: impl Into<String>,
        config: BreakerConfig,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        let name = name.into();
        tracing::info!(
            breaker = %name,
            failure_threshold = config.failure_threshold,
            success_threshold = config.success_threshold,
            reset_timeout_ms = config.reset_timeout_ms,
            call_timeout_ms = config.call_timeout_ms,
            "Circuit breaker created"
        );
        metrics::record_state(&name, CircuitState::Closed);
        Self {
            id: Uuid::new_v4(),
            name,
            config,
            core: RwLock::new(BreakerCore::new()),
            reporter,
            listener: RwLock::new(None),
        }
    }

    /// Unique id of this breaker instance.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the protected dependency.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Register the listener invoked on every state transition. The
    /// callback runs after the state lock is released, so it may call
    /// back into the breaker.
    pub fn set_state_listener(&self, listener: impl Fn(&StateChange) + Send + Sync + 'static) {
        *self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(listener));
    }

    /// Current state (copy).
    pub fn state(&self) -> CircuitState {
        self.read_core().state
    }

    /// Whether a call would be admitted right now. While open this turns
    /// true once the reset timeout elapses, meaning "admit one probe".
    pub fn can_execute(&self) -> bool {
        self.read_core().can_execute(&self.config)
    }

    /// Immutable snapshot of state, counters, timestamps, and configuration.
    pub fn stats(&self) -> BreakerStats {
        let core = self.read_core();
        BreakerStats::snapshot(self.id, &self.name, &self.config, &core)
    }

    /// Run `operation` under breaker protection.
    ///
    /// When admitted, the operation is spawned onto the runtime and raced
    /// against the configured per-call timeout; the caller is never
    /// blocked past that deadline. If the deadline wins, the task is
    /// abandoned and may still be running when this returns; callers
    /// needing earlier cancellation must build it into the operation
    /// itself.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        // Admission and rejection accounting share one critical section.
        let denied = {
            let mut core = self.write_core();
            if core.can_execute(&self.config) {
                None
            } else {
                core.record_rejection();
                Some((core.state, core.consecutive_failures))
            }
        };
        if let Some((state, consecutive_failures)) = denied {
            self.on_rejected(state, consecutive_failures);
            return Err(BreakerError::Open {
                name: self.name.clone(),
                state,
                consecutive_failures,
            });
        }

        // The operation runs on its own task so a stuck call cannot pin
        // this caller past the deadline.
        let handle = tokio::spawn(operation());
        let result = match tokio::time::timeout(self.config.call_timeout(), handle).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(error))) => Err(BreakerError::OperationFailure {
                name: self.name.clone(),
                source: Box::new(error),
            }),
            Ok(Err(join_error)) => {
                if join_error.is_panic() {
                    Err(BreakerError::Panicked {
                        name: self.name.clone(),
                        message: panic_message(join_error.into_panic()),
                    })
                } else {
                    // Runtime shutdown cancelled the task.
                    Err(BreakerError::OperationFailure {
                        name: self.name.clone(),
                        source: Box::new(join_error),
                    })
                }
            }
            // Deadline won; the spawned task is abandoned.
            Err(_) => Err(BreakerError::Timeout {
                name: self.name.clone(),
                timeout: self.config.call_timeout(),
            }),
        };

        self.record_result(result.is_ok(), result.as_ref().err());
        result
    }

    /// Administrative override: move to `state` regardless of trigger
    /// conditions. Logged and reported like an organic transition.
    pub fn force_state(&self, state: CircuitState, reason: &str) {
        let (transition, failures, successes) = {
            let mut core = self.write_core();
            let transition = core.transition_to(state);
            (transition, core.consecutive_failures, core.consecutive_successes)
        };
        if let Some(transition) = transition {
            self.on_transition(&transition, reason, failures, successes);
        }
    }

    /// Reinitialize to closed with every counter and running total zeroed.
    /// In-flight calls are not cancelled; their outcomes are recorded
    /// against whatever state holds when they finish.
    pub fn reset(&self) {
        let transition = self.write_core().reset();
        tracing::info!(breaker = %self.name, "Circuit reset");
        if let Some(transition) = transition {
            self.on_transition(&transition, "manual reset", 0, 0);
        }
    }

    /// Fold an executed call's outcome into the state machine, then emit
    /// reports, metrics, and the listener callback outside the lock.
    fn record_result(&self, success: bool, error: Option<&BreakerError>) {
        let (transition, state_after, failures, successes) = {
            let mut core = self.write_core();
            let transition = core.record_result(success, &self.config);
            (
                transition,
                core.state,
                core.consecutive_failures,
                core.consecutive_successes,
            )
        };

        metrics::record_call(&self.name, if success { "success" } else { "failure" });

        if let Some(error) = error {
            tracing::debug!(breaker = %self.name, error = %error, "Protected call failed");
            self.deliver(
                ReportEntry::new(
                    &self.name,
                    ErrorCode::OperationFailure,
                    Severity::Medium,
                    error.to_string(),
                )
                .with_context("state", state_after.as_str())
                .with_context("failure_count", failures),
            );
        }

        if let Some(transition) = transition {
            let reason = match (transition.from, transition.to) {
                (CircuitState::Closed, CircuitState::Open) => "failure threshold reached",
                (CircuitState::HalfOpen, CircuitState::Open) => "probe failed",
                (CircuitState::Open, CircuitState::HalfOpen) => "probe succeeded",
                (_, CircuitState::Closed) => "success threshold reached",
                _ => "state changed",
            };
            self.on_transition(&transition, reason, failures, successes);
        }
    }

    fn on_rejected(&self, state: CircuitState, failures: u32) {
        tracing::debug!(breaker = %self.name, state = %state, "Call rejected, circuit open");
        metrics::record_call(&self.name, "rejected");
        self.deliver(
            ReportEntry::new(
                &self.name,
                ErrorCode::CircuitOpen,
                Severity::Medium,
                format!("circuit '{}' rejected a call", self.name),
            )
            .with_context("state", state.as_str())
            .with_context("failure_count", failures),
        );
    }

    fn on_transition(&self, transition: &Transition, reason: &str, failures: u32, successes: u32) {
        match transition.to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name,
                from = %transition.from,
                failures,
                reason,
                "Circuit opened"
            ),
            CircuitState::HalfOpen => tracing::info!(
                breaker = %self.name,
                from = %transition.from,
                reason,
                "Circuit half-open, probing for recovery"
            ),
            CircuitState::Closed => tracing::info!(
                breaker = %self.name,
                from = %transition.from,
                successes,
                reason,
                "Circuit closed"
            ),
        }

        metrics::record_transition(&self.name, transition.to);

        let severity = match transition.to {
            CircuitState::Open => Severity::High,
            CircuitState::HalfOpen => Severity::Medium,
            CircuitState::Closed => Severity::Low,
        };
        self.deliver(
            ReportEntry::new(
                &self.name,
                ErrorCode::StateTransition,
                severity,
                format!(
                    "circuit '{}' moved from {} to {}",
                    self.name, transition.from, transition.to
                ),
            )
            .with_context("old_state", transition.from.as_str())
            .with_context("new_state", transition.to.as_str())
            .with_context("failure_count", failures)
            .with_context("success_count", successes)
            .with_context("reason", reason),
        );

        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            let change = StateChange {
                breaker: self.name.clone(),
                from: transition.from,
                to: transition.to,
                reason: reason.to_string(),
            };
            listener(&change);
        }
    }

    /// Hand an entry to the reporting sink. A sink error never fails the
    /// protected call.
    fn deliver(&self, entry: ReportEntry) {
        if let Err(error) = self.reporter.report(entry) {
            tracing::debug!(breaker = %self.name, error = %error, "Failure report dropped");
        }
    }

    // Critical sections are pure arithmetic and cannot panic, so a
    // poisoned guard is recovered rather than propagated.
    fn read_core(&self) -> RwLockReadGuard<'_, BreakerCore> {
        self.core.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_core(&self) -> RwLockWriteGuard<'_, BreakerCore> {
        self.core.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Extract a printable message from a panic payload.
fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BreakerConfig {
        BreakerConfig {
            failure_threshold: 2,
            success_threshold: 2,
            reset_timeout_ms: 10_000,
            call_timeout_ms: 1_000,
        }
    }

    #[tokio::test]
    async fn test_execute_passes_value_through() {
        let breaker = CircuitBreaker::new("billing", test_config());

        let result = breaker
            .execute(|| async { Ok::<_, std::io::Error>(42) })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(breaker.stats().successful_calls, 1);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_failures_open_then_reject() {
        let breaker = CircuitBreaker::new("billing", test_config());

        for _ in 0..2 {
            let _ = breaker
                .execute(|| async { Err::<(), _>(std::io::Error::other("boom")) })
                .await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        let rejected = breaker
            .execute(|| async { Ok::<_, std::io::Error>(()) })
            .await;
        match rejected {
            Err(BreakerError::Open {
                name,
                state,
                consecutive_failures,
            }) => {
                assert_eq!(name, "billing");
                assert_eq!(state, CircuitState::Open);
                assert_eq!(consecutive_failures, 2);
            }
            other => panic!("expected Open error, got {:?}", other),
        }
        assert_eq!(breaker.stats().rejected_calls, 1);
    }

    #[tokio::test]
    async fn test_force_state_and_reset() {
        let breaker = CircuitBreaker::new("billing", test_config());

        breaker.force_state(CircuitState::Open, "maintenance window");
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());

        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.stats().total_calls, 0);
    }
}
