//! Runtime counters for the session-control core

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::gate::InputOutcome;

/// Counters updated by the gate, the fan-out engine and the controller
#[derive(Debug, Default)]
pub struct SessionMetrics {
    inputs_accepted: AtomicU64,
    inputs_rate_limited: AtomicU64,
    inputs_blocked: AtomicU64,
    inputs_banned: AtomicU64,
    deliveries_succeeded: AtomicU64,
    deliveries_failed: AtomicU64,
    destinations_removed: AtomicU64,
    sessions_started: AtomicU64,
    running_since: Mutex<Option<Instant>>,
}

impl SessionMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an admission outcome
    pub fn record_input(&self, outcome: InputOutcome) {
        let counter = match outcome {
            InputOutcome::Accepted => &self.inputs_accepted,
            InputOutcome::RateLimited => &self.inputs_rate_limited,
            InputOutcome::BlockedNonOwner => &self.inputs_blocked,
            InputOutcome::ActorBanned => &self.inputs_banned,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a successful delivery
    pub fn record_delivery(&self) {
        self.deliveries_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed delivery
    pub fn record_fault(&self) {
        self.deliveries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a destination removed for a stale reference
    pub fn record_removal(&self) {
        self.destinations_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark the session as started
    pub fn session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
        *self.running_since.lock() = Some(Instant::now());
    }

    /// Mark the session as stopped; returns how long it ran
    pub fn session_stopped(&self) -> Option<Duration> {
        self.running_since.lock().take().map(|since| since.elapsed())
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let running_since = *self.running_since.lock();

        MetricsSnapshot {
            inputs_accepted: self.inputs_accepted.load(Ordering::Relaxed),
            inputs_rate_limited: self.inputs_rate_limited.load(Ordering::Relaxed),
            inputs_blocked: self.inputs_blocked.load(Ordering::Relaxed),
            inputs_banned: self.inputs_banned.load(Ordering::Relaxed),
            deliveries_succeeded: self.deliveries_succeeded.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
            destinations_removed: self.destinations_removed.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            uptime: running_since.map_or(Duration::ZERO, |since| since.elapsed()),
        }
    }
}

/// Copy of the session counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Inputs forwarded to the emulator
    pub inputs_accepted: u64,
    /// Inputs rejected by the rate limit
    pub inputs_rate_limited: u64,
    /// Inputs rejected by the owner lock
    pub inputs_blocked: u64,
    /// Inputs rejected because the actor is banned
    pub inputs_banned: u64,
    /// Successful deliveries
    pub deliveries_succeeded: u64,
    /// Deliveries that failed with a transport fault
    pub deliveries_failed: u64,
    /// Destinations removed because their messages were deleted
    pub destinations_removed: u64,
    /// Number of times the session was started
    pub sessions_started: u64,
    /// Time the current session has been running
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Total inputs seen, accepted or not
    pub fn inputs_total(&self) -> u64 {
        self.inputs_accepted + self.inputs_rate_limited + self.inputs_blocked + self.inputs_banned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let snapshot = SessionMetrics::new().snapshot();

        assert_eq!(snapshot, MetricsSnapshot::default());
        assert_eq!(snapshot.inputs_total(), 0);
    }

    #[test]
    fn test_record_inputs() {
        let metrics = SessionMetrics::new();

        metrics.record_input(InputOutcome::Accepted);
        metrics.record_input(InputOutcome::Accepted);
        metrics.record_input(InputOutcome::RateLimited);
        metrics.record_input(InputOutcome::BlockedNonOwner);
        metrics.record_input(InputOutcome::ActorBanned);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.inputs_accepted, 2);
        assert_eq!(snapshot.inputs_rate_limited, 1);
        assert_eq!(snapshot.inputs_blocked, 1);
        assert_eq!(snapshot.inputs_banned, 1);
        assert_eq!(snapshot.inputs_total(), 5);
    }

    #[test]
    fn test_session_uptime() {
        let metrics = SessionMetrics::new();
        assert_eq!(metrics.session_stopped(), None);

        metrics.session_started();
        assert_eq!(metrics.snapshot().sessions_started, 1);
        assert!(metrics.session_stopped().is_some());
        assert_eq!(metrics.snapshot().uptime, Duration::ZERO);
    }
}
