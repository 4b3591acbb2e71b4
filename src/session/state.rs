//! Session state machine
//!
//! Tracks whether the shared game session is running.

use std::fmt;
use std::time::{Duration, Instant};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Emulator and renderer are not running
    #[default]
    Stopped,
    /// Emulator and renderer have both been started
    Running,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Stopped => write!(f, "stopped"),
            SessionPhase::Running => write!(f, "running"),
        }
    }
}

/// Complete session state
#[derive(Debug, Default)]
pub struct SessionState {
    /// Current phase
    pub phase: SessionPhase,

    /// Time the current run started
    pub started_at: Option<Instant>,

    /// Number of completed start transitions
    pub runs: u64,
}

impl SessionState {
    /// Create a stopped session
    pub fn new() -> Self {
        Self::default()
    }

    /// Transition to running
    pub fn on_started(&mut self) {
        if self.phase == SessionPhase::Stopped {
            self.phase = SessionPhase::Running;
            self.started_at = Some(Instant::now());
            self.runs += 1;
        }
    }

    /// Transition to stopped; returns how long the run lasted
    pub fn on_stopped(&mut self) -> Option<Duration> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        self.phase = SessionPhase::Stopped;
        self.started_at.take().map(|at| at.elapsed())
    }

    /// Whether the session is running
    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }
}
