//! Metrics recording helpers.
//!
//! # Metrics
//! - `breaker_calls_total` (counter): protected calls by breaker and outcome
//! - `breaker_transitions_total` (counter): state changes by breaker and target
//! - `breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! # Design Decisions
//! - The `metrics` facade only; exporters are wired by the host application
//! - Label values are the breaker name plus short static outcome strings

use crate::breaker::CircuitState;

/// Record one protected call.
pub fn record_call(breaker: &str, outcome: &'static str) {
    metrics::counter!(
        "breaker_calls_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a state transition and refresh the state gauge.
pub fn record_transition(breaker: &str, to: CircuitState) {
    metrics::counter!(
        "breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
    record_state(breaker, to);
}

/// Refresh the state gauge.
pub fn record_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("breaker_state", "breaker" => breaker.to_string()).set(value);
}
