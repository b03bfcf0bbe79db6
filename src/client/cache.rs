// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Short-lived read-through cache for batch responses
//!
//! Entries are keyed by read scope (`page_motors`, `all_variables`, ...) and
//! expire once their age reaches the TTL. The cache is only ever cleared as a
//! whole: on token change, on any write attempt and on any 401.
//!
//! With the generation guard enabled, a fetch takes a [`FetchTicket`] before
//! going to the network and may only store its response if no newer fetch for
//! the same key was issued and no clear happened in between. Without it, the
//! last completer wins.
//!
//! Stale entries are evicted on lookup and whenever a fetch completes, so keys
//! that are never read again (e.g. one-off series queries) do not accumulate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::debug;

use crate::utility::Clock;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    captured_at: Instant,
}

#[derive(Debug)]
struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    /// Latest generation issued per key
    issued: HashMap<String, u64>,
    next_generation: u64,
    /// Bumped on every clear
    epoch: u64,
}

/// Proof that a fetch was started, used to validate its completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: String,
    generation: u64,
    epoch: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// TTL cache shared by the clones of a client
#[derive(Debug)]
pub struct ResponseCache<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    generation_guard: bool,
    state: Mutex<CacheState<T>>,
}

impl<T: Clone> ResponseCache<T> {
    /// Create an empty cache
    ///
    /// # Arguments
    ///
    /// * `ttl` - Age at which an entry stops being served
    /// * `clock` - Time source used for entry ages
    /// * `generation_guard` - Discard responses superseded by a newer fetch or a clear
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>, generation_guard: bool) -> Self {
        Self {
            ttl,
            clock,
            generation_guard,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                issued: HashMap::new(),
                next_generation: 0,
                epoch: 0,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn generation_guard(&self) -> bool {
        self.generation_guard
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let mut state = self.lock();
        let entry = state.entries.get(key)?;
        if now.saturating_duration_since(entry.captured_at) < self.ttl {
            debug!("Cache hit for {}", key);
            Some(entry.value.clone())
        } else {
            debug!("Cache entry for {} is stale", key);
            state.entries.remove(key);
            None
        }
    }

    /// Register a fetch for `key` about to hit the network
    pub fn begin_fetch(&self, key: &str) -> FetchTicket {
        let mut state = self.lock();
        state.next_generation += 1;
        let generation = state.next_generation;
        state.issued.insert(key.to_string(), generation);
        FetchTicket {
            key: key.to_string(),
            generation,
            epoch: state.epoch,
        }
    }

    /// Store the response of a fetch
    ///
    /// Returns `false` when the generation guard discarded the response.
    pub fn complete_fetch(&self, ticket: FetchTicket, value: T) -> bool {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut state = self.lock();
        state
            .entries
            .retain(|_, entry| now.saturating_duration_since(entry.captured_at) < ttl);

        let latest = state.issued.get(&ticket.key).copied();
        if latest == Some(ticket.generation) {
            state.issued.remove(&ticket.key);
        }

        if self.generation_guard
            && (ticket.epoch != state.epoch || latest != Some(ticket.generation))
        {
            debug!(
                "Discarding superseded response for {} (generation {})",
                ticket.key, ticket.generation
            );
            return false;
        }

        state.entries.insert(
            ticket.key,
            CacheEntry {
                value,
                captured_at: now,
            },
        );
        true
    }

    /// Forget a fetch that failed
    pub fn abandon_fetch(&self, ticket: FetchTicket) {
        let mut state = self.lock();
        if state.issued.get(&ticket.key) == Some(&ticket.generation) {
            state.issued.remove(&ticket.key);
        }
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.issued.clear();
        state.epoch += 1;
    }

    /// Number of stored entries, fresh or stale
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::ManualClock;

    fn cache(guard: bool) -> (Arc<ManualClock>, ResponseCache<u32>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ResponseCache::new(Duration::from_millis(500), clock.clone(), guard);
        (clock, cache)
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (clock, cache) = cache(true);
        let ticket = cache.begin_fetch("page_motors");
        assert!(cache.complete_fetch(ticket, 1));

        clock.advance(Duration::from_millis(499));
        assert_eq!(cache.get("page_motors"), Some(1));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get("page_motors"), None);
    }

    #[test]
    fn test_keys_are_independent() {
        let (_clock, cache) = cache(true);
        let ticket = cache.begin_fetch("page_main");
        cache.complete_fetch(ticket, 7);
        assert_eq!(cache.get("page_main"), Some(7));
        assert_eq!(cache.get("all_variables"), None);
    }

    #[test]
    fn test_clear_drops_everything() {
        let (_clock, cache) = cache(false);
        for key in ["a", "b", "c"] {
            let ticket = cache.begin_fetch(key);
            cache.complete_fetch(ticket, 1);
        }
        assert_eq!(cache.len(), 3);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_guard_discards_fetch_started_before_clear() {
        let (_clock, cache) = cache(true);
        let ticket = cache.begin_fetch("page_motors");
        cache.clear();
        assert!(!cache.complete_fetch(ticket, 1));
        assert_eq!(cache.get("page_motors"), None);
    }

    #[test]
    fn test_guard_discards_superseded_fetch() {
        let (_clock, cache) = cache(true);
        let slow = cache.begin_fetch("page_motors");
        let fast = cache.begin_fetch("page_motors");
        assert!(cache.complete_fetch(fast, 2));
        assert!(!cache.complete_fetch(slow, 1));
        assert_eq!(cache.get("page_motors"), Some(2));
    }

    #[test]
    fn test_without_guard_last_completer_wins() {
        let (_clock, cache) = cache(false);
        let slow = cache.begin_fetch("page_motors");
        let fast = cache.begin_fetch("page_motors");
        cache.clear();
        assert!(cache.complete_fetch(fast, 2));
        assert!(cache.complete_fetch(slow, 1));
        assert_eq!(cache.get("page_motors"), Some(1));
    }

    #[test]
    fn test_stale_entries_are_evicted() {
        let (clock, cache) = cache(true);
        for range in ["5m", "30m", "1h"] {
            let ticket = cache.begin_fetch(&format!("motor_series_1_rpm_{}_180", range));
            cache.complete_fetch(ticket, 1);
        }
        assert_eq!(cache.len(), 3);

        clock.advance(Duration::from_millis(500));
        assert_eq!(cache.get("motor_series_1_rpm_5m_180"), None);
        assert_eq!(cache.len(), 2);

        let ticket = cache.begin_fetch("page_main");
        cache.complete_fetch(ticket, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.lock().issued.is_empty());
    }

    #[test]
    fn test_abandoned_fetch_is_forgotten() {
        let (_clock, cache) = cache(true);
        let failed = cache.begin_fetch("page_alarms");
        cache.abandon_fetch(failed);
        assert!(cache.lock().issued.is_empty());

        // An abandoned older fetch does not drop the newer one's generation
        let older = cache.begin_fetch("page_alarms");
        let newer = cache.begin_fetch("page_alarms");
        cache.abandon_fetch(older);
        assert!(cache.complete_fetch(newer, 3));
        assert_eq!(cache.get("page_alarms"), Some(3));
    }
}
