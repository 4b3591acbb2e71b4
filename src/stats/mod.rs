//! Statistics and metrics for the session-control core

pub mod metrics;

pub use metrics::{MetricsSnapshot, SessionMetrics};
