//! Shared test doubles for breaker integration tests.

use std::sync::{Arc, Mutex};

use circuit_breaker::{ErrorCode, FailureReporter, ReportEntry, ReportingError};

/// Records every entry it receives so tests can assert on them.
#[derive(Default)]
pub struct RecordingReporter {
    entries: Mutex<Vec<ReportEntry>>,
}

#[allow(dead_code)]
impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.entries().iter().map(|entry| entry.code).collect()
    }
}

impl FailureReporter for RecordingReporter {
    fn report(&self, entry: ReportEntry) -> Result<(), ReportingError> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

/// Rejects every entry, for verifying reports never fail protected calls.
pub struct FailingReporter;

impl FailureReporter for FailingReporter {
    fn report(&self, _entry: ReportEntry) -> Result<(), ReportingError> {
        Err(ReportingError("sink unavailable".into()))
    }
}

/// Error returned by failing test operations.
pub fn boom() -> std::io::Error {
    std::io::Error::other("backend exploded")
}
