//! Point-in-time breaker snapshots.

use serde::Serialize;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::breaker::state::{BreakerCore, CircuitState};
use crate::config::BreakerConfig;

/// An immutable copy of one breaker's observable state. The sole supported
/// way to inspect breaker health externally; no internal field is ever
/// exposed by reference.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStats {
    pub id: Uuid,
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub rejected_calls: u64,
    /// Epoch milliseconds; `None` until the event first happens.
    pub last_failure_ms: Option<u64>,
    pub last_success_ms: Option<u64>,
    pub last_state_change_ms: Option<u64>,
    pub config: BreakerConfig,
}

impl BreakerStats {
    pub(crate) fn snapshot(
        id: Uuid,
        name: &str,
        config: &BreakerConfig,
        core: &BreakerCore,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            state: core.state,
            consecutive_failures: core.consecutive_failures,
            consecutive_successes: core.consecutive_successes,
            total_calls: core.total_calls,
            successful_calls: core.successful_calls,
            failed_calls: core.failed_calls,
            rejected_calls: core.rejected_calls,
            last_failure_ms: epoch_ms(core.last_failure),
            last_success_ms: epoch_ms(core.last_success),
            last_state_change_ms: epoch_ms(core.last_state_change),
            config: config.clone(),
        }
    }

    /// Fraction of all calls (rejected included) that succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            1.0
        } else {
            self.successful_calls as f64 / self.total_calls as f64
        }
    }
}

/// Project a monotonic instant onto the wall clock.
fn epoch_ms(at: Option<Instant>) -> Option<u64> {
    let at = at?;
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    Some(now_ms.saturating_sub(at.elapsed().as_millis() as u64))
}
