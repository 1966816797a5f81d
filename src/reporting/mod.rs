//! Failure reporting toward an external error catalog.
//!
//! # Responsibilities
//! - Define the sink contract for structured failure entries
//! - Provide a no-op sink for callers that do not report
//! - Provide a tracing-backed sink for plain log output
//!
//! # Design Decisions
//! - The sink is invoked synchronously on rejections, failures, and transitions
//! - A sink error never fails the protected call; the breaker swallows it

pub mod entry;

pub use entry::{ErrorCode, ReportEntry, Severity};

use crate::errors::ReportingError;

/// Sink accepting structured failure entries.
pub trait FailureReporter: Send + Sync {
    /// Deliver one entry. Errors are swallowed (and logged) by the breaker.
    fn report(&self, entry: ReportEntry) -> Result<(), ReportingError>;
}

/// Discards every entry. Substituted when no reporter is supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl FailureReporter for NoopReporter {
    fn report(&self, _entry: ReportEntry) -> Result<(), ReportingError> {
        Ok(())
    }
}

/// Routes entries to `tracing`, level picked by severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl FailureReporter for LogReporter {
    fn report(&self, entry: ReportEntry) -> Result<(), ReportingError> {
        match entry.severity {
            Severity::High => tracing::warn!(
                component = %entry.component,
                code = %entry.code,
                context = ?entry.context,
                "{}",
                entry.message
            ),
            Severity::Medium => tracing::info!(
                component = %entry.component,
                code = %entry.code,
                context = ?entry.context,
                "{}",
                entry.message
            ),
            Severity::Low => tracing::debug!(
                component = %entry.component,
                code = %entry.code,
                context = ?entry.context,
                "{}",
                entry.message
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_accepts_everything() {
        let entry = ReportEntry::new("billing", ErrorCode::CircuitOpen, Severity::Low, "rejected");
        assert!(NoopReporter.report(entry).is_ok());
    }

    #[test]
    fn test_log_reporter_accepts_everything() {
        let entry =
            ReportEntry::new("billing", ErrorCode::StateTransition, Severity::High, "opened");
        assert!(LogReporter.report(entry).is_ok());
    }
}
