//! Input admission policy
//!
//! Decides whether an actor's input reaches the emulator. Checks run in a
//! fixed order: owner lock, ban, rate limit. Only an accepted input touches
//! the rate-limit cache.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::id::ActorId;

use super::cache::RateLimitCache;
use super::input::UserInput;

/// Owner and ban lookups needed by the gate
pub trait AccessPolicy {
    /// Whether the actor has owner permission
    fn is_owner(&self, actor: ActorId) -> bool;

    /// Whether the actor is banned
    fn is_banned(&self, actor: ActorId) -> bool;
}

/// Result of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputOutcome {
    /// Input may be forwarded
    Accepted,
    /// Actor sent input too recently
    RateLimited,
    /// Input is locked to owners and the actor is not one
    BlockedNonOwner,
    /// Actor is banned
    ActorBanned,
}

impl InputOutcome {
    /// Whether the input was admitted
    pub fn is_accepted(&self) -> bool {
        matches!(self, InputOutcome::Accepted)
    }
}

impl fmt::Display for InputOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InputOutcome::Accepted => "Input accepted.",
            InputOutcome::RateLimited => "Slow down, you are sending input too fast.",
            InputOutcome::BlockedNonOwner => "Input is currently locked to owners.",
            InputOutcome::ActorBanned => "You are banned from this event.",
        };
        f.write_str(text)
    }
}

struct GateState {
    window: Duration,
    cache: RateLimitCache,
}

/// Admission gate for actor input
pub struct InputGate {
    state: Mutex<GateState>,
    owners_only: AtomicBool,
}

impl InputGate {
    /// Create a gate with the given window and cache capacity
    pub fn new(window: Duration, cache_capacity: usize) -> Self {
        Self {
            state: Mutex::new(GateState {
                window,
                cache: RateLimitCache::with_capacity(cache_capacity),
            }),
            owners_only: AtomicBool::new(false),
        }
    }

    /// Decide whether `input` is admitted
    ///
    /// The rate-limit check and the record of an accepted input happen under
    /// one lock, so the same actor cannot slip two inputs into one window.
    pub fn admit<P: AccessPolicy + ?Sized>(&self, policy: &P, input: &UserInput) -> InputOutcome {
        let actor = input.actor;

        if self.owners_only() && !policy.is_owner(actor) {
            return InputOutcome::BlockedNonOwner;
        }

        if policy.is_banned(actor) {
            return InputOutcome::ActorBanned;
        }

        let mut state = self.state.lock();
        let window = state.window;

        // No record means the first input, which always passes
        let elapsed = state
            .cache
            .elapsed(actor, input.at, window)
            .unwrap_or(window);

        if elapsed < window {
            return InputOutcome::RateLimited;
        }

        state.cache.record(actor, input.at, window);
        InputOutcome::Accepted
    }

    /// Lock or unlock input to owners
    pub fn set_owners_only(&self, locked: bool) {
        self.owners_only.store(locked, Ordering::Relaxed);
    }

    /// Whether input is locked to owners
    pub fn owners_only(&self) -> bool {
        self.owners_only.load(Ordering::Relaxed)
    }

    /// Change the rate-limit window
    pub fn set_window(&self, window: Duration) {
        self.state.lock().window = window;
    }

    /// Current rate-limit window
    pub fn window(&self) -> Duration {
        self.state.lock().window
    }

    /// Number of actors currently held in the rate-limit cache
    pub fn tracked_actors(&self) -> usize {
        self.state.lock().cache.len()
    }
}
