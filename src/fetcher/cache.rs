//! Time-bounded cache of fetched tables.
//!
//! Each table name owns a slot guarded by its own mutex. Holding a slot's
//! lock for the whole fetch means two callers asking for the same table
//! share one remote call, while different tables are fetched independently.

use crate::analyser::Table;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Tables are considered fresh for ten minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Source of the current time for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *lock(&self.now)
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub table: Arc<Table>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

pub type Slot = Arc<Mutex<Option<CacheEntry>>>;

#[derive(Debug, Default)]
pub struct TableCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `name`, created empty on first use.
    pub fn slot(&self, name: &str) -> Slot {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(name.to_owned()).or_default())
    }

    /// Forgets `name` entirely. A fetch still holding the old slot keeps
    /// its result to itself.
    pub fn invalidate(&self, name: &str) {
        let slot = lock(&self.slots).remove(name);
        if let Some(slot) = slot {
            *lock(&slot) = None;
        }
    }

    pub fn clear(&self) {
        let slots: Vec<Slot> = lock(&self.slots).drain().map(|(_, slot)| slot).collect();
        for slot in slots {
            *lock(&slot) = None;
        }
    }

    /// Drops the slot for `name` when `slot` is still the current one and
    /// no other caller holds it.
    pub fn release(&self, name: &str, slot: &Slot) {
        let mut slots = lock(&self.slots);
        let idle = slots
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
            && Arc::strong_count(slot) <= 2;
        if idle {
            slots.remove(name);
        }
    }

    /// Number of names with a stored table, fresh or not.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of names the cache is tracking, including fetches in flight.
    pub fn slot_count(&self) -> usize {
        lock(&self.slots).len()
    }
}

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_freshness() {
        let clock = ManualClock::new();
        let entry = CacheEntry {
            table: Arc::new(Table::empty()),
            fetched_at: clock.now(),
        };
        assert!(entry.is_fresh(clock.now(), DEFAULT_TTL));
        clock.advance(Duration::from_secs(599));
        assert!(entry.is_fresh(clock.now(), DEFAULT_TTL));
        clock.advance(Duration::from_secs(1));
        assert!(!entry.is_fresh(clock.now(), DEFAULT_TTL));
    }

    #[test]
    fn test_slots_are_shared_per_name() {
        let cache = TableCache::new();
        let a = cache.slot("a");
        let again = cache.slot("a");
        let b = cache.slot("b");
        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = TableCache::new();
        for name in ["a", "b", "c"] {
            *lock(&cache.slot(name)) = Some(CacheEntry {
                table: Arc::new(Table::empty()),
                fetched_at: Instant::now(),
            });
        }
        assert_eq!(cache.len(), 3);
        cache.invalidate("a");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.slot_count(), 2);
        cache.invalidate("never-fetched");
        assert_eq!(cache.slot_count(), 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.slot_count(), 0);
    }

    #[test]
    fn test_invalidate_detaches_slot_in_use() {
        let cache = TableCache::new();
        let held = cache.slot("a");
        cache.invalidate("a");
        let fresh = cache.slot("a");
        assert!(!Arc::ptr_eq(&held, &fresh));
    }

    #[test]
    fn test_release_only_drops_idle_slot() {
        let cache = TableCache::new();
        let slot = cache.slot("a");
        let waiter = cache.slot("a");
        cache.release("a", &slot);
        assert_eq!(cache.slot_count(), 1, "another caller still holds the slot");

        drop(waiter);
        cache.release("a", &slot);
        assert_eq!(cache.slot_count(), 0);

        let replaced = cache.slot("a");
        cache.release("a", &slot);
        assert_eq!(cache.slot_count(), 1, "a newer slot is left alone");
        drop(replaced);
    }
}
