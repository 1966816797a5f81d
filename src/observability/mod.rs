//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured events go through `tracing`; the host owns the subscriber
//! - Metric updates are cheap counter/gauge calls behind the `metrics` facade
//! - Failure reports toward the error catalog live in `crate::reporting`

pub mod metrics;
