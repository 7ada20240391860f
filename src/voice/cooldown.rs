//! Per-user creation cooldown.
//!
//! Voice state updates arrive in bursts when a client flaps between
//! channels, and each one landing on a trigger would otherwise spawn a
//! channel. The tracker debounces creations per user over a short window.
//! The map is bounded: stale entries are purged opportunistically and, at
//! capacity, the oldest entry is evicted so one busy shard can never grow
//! it without limit.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serenity::model::id::UserId;
use tracing::trace;

/// Bounded map of user id to the instant of their last accepted creation.
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    capacity: usize,
    entries: Mutex<HashMap<UserId, Instant>>,
}

impl CooldownTracker {
    /// A tracker that debounces over `window` and holds at most `capacity` users.
    #[must_use]
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Records a creation attempt for `user`.
    ///
    /// Returns `false` while the user's previous attempt is still inside
    /// the cooldown window, `true` otherwise.
    pub fn try_acquire(&self, user: UserId) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        entries.retain(|_, at| now.duration_since(*at) < self.window);
        if entries.contains_key(&user) {
            trace!(%user, "Creation attempt inside cooldown window");
            return false;
        }
        if entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(user, _)| *user);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(user, now);
        true
    }

    /// Forgets the user's last attempt so they can retry immediately.
    /// Called when a creation is aborted or fails.
    pub fn release(&self, user: UserId) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&user);
    }

    /// Entries currently tracked, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no users are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_attempt_is_debounced() {
        let tracker = CooldownTracker::new(Duration::from_secs(2), 100);
        let user = UserId::new(1);

        assert!(tracker.try_acquire(user));
        assert!(!tracker.try_acquire(user));
    }

    #[test]
    fn test_release_allows_immediate_retry() {
        let tracker = CooldownTracker::new(Duration::from_secs(2), 100);
        let user = UserId::new(1);

        assert!(tracker.try_acquire(user));
        tracker.release(user);
        assert!(tracker.try_acquire(user));
    }

    #[test]
    fn test_window_expiry() {
        let tracker = CooldownTracker::new(Duration::from_millis(20), 100);
        let user = UserId::new(1);

        assert!(tracker.try_acquire(user));
        std::thread::sleep(Duration::from_millis(40));
        assert!(tracker.try_acquire(user));
        // The purge dropped the stale entry instead of accumulating it.
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let tracker = CooldownTracker::new(Duration::from_secs(60), 2);

        // Spaced out so the entries have strictly ordered timestamps.
        assert!(tracker.try_acquire(UserId::new(1)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(tracker.try_acquire(UserId::new(2)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(tracker.try_acquire(UserId::new(3)));
        assert_eq!(tracker.len(), 2);

        // User 1 was the oldest entry and got evicted, so they may retry.
        assert!(tracker.try_acquire(UserId::new(1)));
    }

    #[test]
    fn test_independent_users() {
        let tracker = CooldownTracker::new(Duration::from_secs(2), 100);
        assert!(tracker.try_acquire(UserId::new(1)));
        assert!(tracker.try_acquire(UserId::new(2)));
        assert!(!tracker.try_acquire(UserId::new(1)));
    }
}
