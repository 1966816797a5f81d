//! Structured failure report entries.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Short machine-readable code classifying a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A call was rejected because the circuit is open.
    CircuitOpen,
    /// A wrapped operation returned an error, timed out, or panicked.
    OperationFailure,
    /// The breaker moved between states.
    StateTransition,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CircuitOpen => "CIRCUIT_OPEN",
            Self::OperationFailure => "OPERATION_FAILURE",
            Self::StateTransition => "STATE_TRANSITION",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently an operator should care about an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured entry handed to the failure-reporting sink.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub id: Uuid,
    /// Name of the breaker that produced the entry.
    pub component: String,
    pub code: ErrorCode,
    pub message: String,
    pub severity: Severity,
    /// Free-form context: counters, old/new state, reason.
    pub context: HashMap<String, Value>,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl ReportEntry {
    /// Build an entry stamped with a fresh id and the current time.
    pub fn new(
        component: impl Into<String>,
        code: ErrorCode,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            id: Uuid::new_v4(),
            component: component.into(),
            code,
            message: message.into(),
            severity,
            context: HashMap::new(),
            timestamp_ms,
        }
    }

    /// Attach a context value.
    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}
