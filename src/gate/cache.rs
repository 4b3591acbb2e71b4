//! Rate-limit cache
//!
//! Remembers when each actor last had an input accepted. Entries are only
//! meaningful for one rate-limit window, so they count as expired once the
//! window has elapsed. The cache is bounded: inserting a new actor into a
//! full cache first purges expired entries, then evicts the oldest one.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use crate::id::ActorId;

/// Bounded map of actor → last accepted input
///
/// `by_age` mirrors `entries` ordered by timestamp, so expiry and eviction
/// walk from the front instead of scanning every actor.
#[derive(Debug)]
pub struct RateLimitCache {
    entries: HashMap<ActorId, Instant>,
    by_age: BTreeSet<(Instant, ActorId)>,
    capacity: usize,
}

impl RateLimitCache {
    /// Create a cache holding at most `capacity` actors
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            entries: HashMap::with_capacity(capacity.min(1024)),
            by_age: BTreeSet::new(),
            capacity,
        }
    }

    /// Maximum number of tracked actors
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tracked actors, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no actor is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time since the actor's last accepted input, if still within `window`
    pub fn elapsed(&self, actor: ActorId, now: Instant, window: Duration) -> Option<Duration> {
        let last = self.entries.get(&actor)?;
        let elapsed = now.saturating_duration_since(*last);

        (elapsed < window).then_some(elapsed)
    }

    /// Record an accepted input
    pub fn record(&mut self, actor: ActorId, now: Instant, window: Duration) {
        if !self.entries.contains_key(&actor) && self.entries.len() >= self.capacity {
            self.purge_expired(now, window);

            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
        }

        if let Some(previous) = self.entries.insert(actor, now) {
            self.by_age.remove(&(previous, actor));
        }
        self.by_age.insert((now, actor));
    }

    /// Drop every entry older than `window`
    pub fn purge_expired(&mut self, now: Instant, window: Duration) {
        while let Some(&(last, actor)) = self.by_age.first() {
            if now.saturating_duration_since(last) < window {
                break;
            }

            self.by_age.pop_first();
            self.entries.remove(&actor);
        }
    }

    fn evict_oldest(&mut self) {
        if let Some((_, actor)) = self.by_age.pop_first() {
            self.entries.remove(&actor);
            tracing::trace!(actor = %actor, "Evicted oldest rate-limit entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(1_500);

    #[test]
    fn test_unknown_actor_has_no_record() {
        let cache = RateLimitCache::with_capacity(4);
        assert_eq!(cache.elapsed(ActorId(1), Instant::now(), WINDOW), None);
    }

    #[test]
    fn test_entry_expires_after_window() {
        let mut cache = RateLimitCache::with_capacity(4);
        let t0 = Instant::now();
        cache.record(ActorId(1), t0, WINDOW);

        assert_eq!(
            cache.elapsed(ActorId(1), t0 + Duration::from_millis(500), WINDOW),
            Some(Duration::from_millis(500))
        );
        assert_eq!(cache.elapsed(ActorId(1), t0 + WINDOW, WINDOW), None);
    }

    #[test]
    fn test_full_cache_purges_expired_first() {
        let mut cache = RateLimitCache::with_capacity(2);
        let t0 = Instant::now();

        cache.record(ActorId(1), t0, WINDOW);
        cache.record(ActorId(2), t0 + Duration::from_secs(1), WINDOW);

        // actor 1 has expired by now, actor 2 has not
        let t1 = t0 + Duration::from_secs(2);
        cache.record(ActorId(3), t1, WINDOW);

        assert_eq!(cache.len(), 2);
        assert!(cache.elapsed(ActorId(2), t1, WINDOW).is_some());
        assert!(cache.elapsed(ActorId(3), t1, WINDOW).is_some());
    }

    #[test]
    fn test_full_cache_evicts_oldest() {
        let mut cache = RateLimitCache::with_capacity(2);
        let t0 = Instant::now();

        cache.record(ActorId(1), t0, WINDOW);
        cache.record(ActorId(2), t0 + Duration::from_millis(100), WINDOW);
        cache.record(ActorId(3), t0 + Duration::from_millis(200), WINDOW);

        let now = t0 + Duration::from_millis(300);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.elapsed(ActorId(1), now, WINDOW), None);
        assert!(cache.elapsed(ActorId(2), now, WINDOW).is_some());
        assert!(cache.elapsed(ActorId(3), now, WINDOW).is_some());
    }

    #[test]
    fn test_known_actor_does_not_evict() {
        let mut cache = RateLimitCache::with_capacity(2);
        let t0 = Instant::now();

        cache.record(ActorId(1), t0, WINDOW);
        cache.record(ActorId(2), t0, WINDOW);
        cache.record(ActorId(1), t0 + WINDOW, WINDOW);

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_rerecorded_actor_is_not_evicted_as_oldest() {
        let mut cache = RateLimitCache::with_capacity(2);
        let t0 = Instant::now();

        cache.record(ActorId(1), t0, WINDOW);
        cache.record(ActorId(2), t0 + Duration::from_millis(100), WINDOW);
        // actor 1 is now the most recent
        cache.record(ActorId(1), t0 + Duration::from_millis(200), WINDOW);
        cache.record(ActorId(3), t0 + Duration::from_millis(300), WINDOW);

        let now = t0 + Duration::from_millis(400);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.elapsed(ActorId(2), now, WINDOW), None);
        assert_eq!(
            cache.elapsed(ActorId(1), now, WINDOW),
            Some(Duration::from_millis(200))
        );
        assert!(cache.elapsed(ActorId(3), now, WINDOW).is_some());
    }

    #[test]
    fn test_purge_stops_at_first_live_entry() {
        let mut cache = RateLimitCache::with_capacity(8);
        let t0 = Instant::now();

        for (actor, offset_ms) in [(1, 0), (2, 200), (3, 1_000), (4, 1_400)] {
            cache.record(ActorId(actor), t0 + Duration::from_millis(offset_ms), WINDOW);
        }

        cache.purge_expired(t0 + Duration::from_millis(1_700), WINDOW);

        assert_eq!(cache.len(), 2);
        let now = t0 + Duration::from_millis(1_700);
        assert!(cache.elapsed(ActorId(3), now, WINDOW).is_some());
        assert!(cache.elapsed(ActorId(4), now, WINDOW).is_some());
    }
}
