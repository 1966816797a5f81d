//! Breaker registry.
//!
//! # Responsibilities
//! - Hold one breaker per protected downstream, keyed by name
//! - Mint breakers lazily from a shared default configuration
//! - Aggregate snapshots for observability handlers

use dashmap::DashMap;
use std::sync::Arc;

use crate::breaker::{BreakerStats, CircuitBreaker};
use crate::config::BreakerConfig;
use crate::reporting::{FailureReporter, NoopReporter};

/// A named collection of circuit breakers sharing a default configuration
/// and a failure-reporting sink.
pub struct BreakerRegistry {
    default_config: BreakerConfig,
    reporter: Arc<dyn FailureReporter>,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    /// Create a registry whose breakers do not report failures.
    pub fn new(default_config: BreakerConfig) -> Self {
        Self::with_reporter(default_config, Arc::new(NoopReporter))
    }

    /// Create a registry wiring every minted breaker to `reporter`.
    pub fn with_reporter(
        default_config: BreakerConfig,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        Self {
            default_config,
            reporter,
            breakers: DashMap::new(),
        }
    }

    /// Fetch the breaker for `name`, creating it from the default
    /// configuration on first use.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::with_reporter(
                    name,
                    self.default_config.clone(),
                    self.reporter.clone(),
                ))
            })
            .clone()
    }

    /// Fetch an existing breaker.
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| entry.value().clone())
    }

    /// Insert a breaker built with a non-default configuration, replacing
    /// any previous breaker registered under the same name.
    pub fn register(&self, breaker: CircuitBreaker) -> Arc<CircuitBreaker> {
        let breaker = Arc::new(breaker);
        self.breakers
            .insert(breaker.name().to_string(), breaker.clone());
        breaker
    }

    /// Snapshot every registered breaker.
    pub fn stats_all(&self) -> Vec<BreakerStats> {
        self.breakers
            .iter()
            .map(|entry| entry.value().stats())
            .collect()
    }

    /// Manually reset every registered breaker to closed.
    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().reset();
        }
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
