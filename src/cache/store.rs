//! Cache Store Module
//!
//! Concurrent key-value storage bounded by item count and estimated memory,
//! with lazy TTL expiration and expiry-ordered eviction.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, EstimateSize, BYTES_PER_MB, DEFAULT_MAX_ITEMS};

// == Set Outcome ==
/// Result of a write.
///
/// A value whose own estimate exceeds the memory bound is rejected outright;
/// nothing is evicted on its behalf and any previous value under the same key
/// is dropped so a stale value is never served after a failed refresh.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Stored,
    Rejected,
}

impl SetOutcome {
    pub fn is_stored(self) -> bool {
        matches!(self, SetOutcome::Stored)
    }
}

// == Store State ==
/// Everything guarded by the store lock.
#[derive(Debug)]
struct StoreState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Always equals the sum of `entries[*].size`
    memory_bytes: usize,
}

impl<V> StoreState<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            memory_bytes: 0,
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.memory_bytes -= entry.size;
        Some(entry)
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let mut freed = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired_at(now) {
                freed += entry.size;
                false
            } else {
                true
            }
        });
        self.memory_bytes -= freed;
        before - self.entries.len()
    }

    /// Removes the `count` entries closest to expiring.
    fn evict_nearest_expiring(&mut self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }

        // Max-heap capped at `count`: whatever survives is the `count` smallest.
        let mut heap: BinaryHeap<(Instant, &String)> = BinaryHeap::with_capacity(count + 1);
        for (key, entry) in &self.entries {
            heap.push((entry.expires_at, key));
            if heap.len() > count {
                heap.pop();
            }
        }
        let victims: Vec<String> = heap.into_iter().map(|(_, key)| key.clone()).collect();

        for key in &victims {
            self.remove(key);
        }
        victims.len()
    }

    /// Removes entries closest to expiring until `incoming` more bytes fit.
    fn evict_to_fit(&mut self, incoming: usize, max_memory_bytes: usize) -> usize {
        let mut heap: BinaryHeap<Reverse<(Instant, String)>> = self
            .entries
            .iter()
            .map(|(key, entry)| Reverse((entry.expires_at, key.clone())))
            .collect();

        let mut evicted = 0;
        while self.memory_bytes + incoming > max_memory_bytes {
            let Some(Reverse((_, key))) = heap.pop() else {
                break;
            };
            self.remove(&key);
            evicted += 1;
        }
        evicted
    }
}

// == Cache Store ==
/// TTL-aware store bounded by item count and estimated memory.
///
/// Reads (`get`, `stats`) share the lock; every mutation takes it exclusively.
#[derive(Debug)]
pub struct CacheStore<V> {
    state: RwLock<StoreState<V>>,
    /// TTL applied when a write passes a zero TTL
    default_ttl: Duration,
    /// Maximum number of entries, 0 = unlimited
    max_items: usize,
    /// Maximum estimated memory in bytes, 0 = unlimited
    max_memory_bytes: usize,
}

impl<V: EstimateSize> CacheStore<V> {
    // == Constructor ==
    /// Creates a store with explicit bounds.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL used when `set` is called with a zero TTL
    /// * `max_items` - Maximum number of entries (0 = unlimited)
    /// * `max_memory_bytes` - Maximum estimated footprint (0 = unlimited)
    pub fn new(default_ttl: Duration, max_items: usize, max_memory_bytes: usize) -> Self {
        Self {
            state: RwLock::new(StoreState::new()),
            default_ttl,
            max_items,
            max_memory_bytes,
        }
    }

    /// Creates a memory-bounded store with the default item ceiling.
    pub fn with_memory_limit_mb(default_ttl: Duration, max_memory_mb: usize) -> Self {
        Self::new(default_ttl, DEFAULT_MAX_ITEMS, max_memory_mb.saturating_mul(BYTES_PER_MB))
    }

    // == Set ==
    /// Stores a value, replacing any previous value under `key`.
    ///
    /// A zero `ttl` uses the store default. When the item bound is reached,
    /// expired entries are purged first and then the entries nearest to
    /// expiring are evicted until one slot is free. The memory bound is then
    /// enforced the same way until the new value fits.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) -> SetOutcome {
        let key = key.into();
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let size = value.estimate_size();

        let mut guard = self.state.write();
        let state = &mut *guard;

        state.remove(&key);

        if self.max_memory_bytes > 0 && size > self.max_memory_bytes {
            warn!(
                "Rejected cache write for {}: estimated {} bytes exceeds limit of {} bytes",
                key, size, self.max_memory_bytes
            );
            return SetOutcome::Rejected;
        }

        let now = Instant::now();

        if self.max_items > 0 && state.entries.len() >= self.max_items {
            let purged = state.purge_expired(now);
            let mut evicted = 0;
            if state.entries.len() >= self.max_items {
                let excess = state.entries.len() - self.max_items + 1;
                evicted = state.evict_nearest_expiring(excess);
            }
            debug!(
                "Item limit reached: purged {} expired, evicted {} entries",
                purged, evicted
            );
        }

        if self.max_memory_bytes > 0 && state.memory_bytes + size > self.max_memory_bytes {
            let purged = state.purge_expired(now);
            let mut evicted = 0;
            if state.memory_bytes + size > self.max_memory_bytes {
                evicted = state.evict_to_fit(size, self.max_memory_bytes);
            }
            debug!(
                "Memory limit reached: purged {} expired, evicted {} entries",
                purged, evicted
            );
        }

        state
            .entries
            .insert(key, CacheEntry::new_at(value, now, ttl, size));
        state.memory_bytes += size;

        SetOutcome::Stored
    }

    // == Get ==
    /// Returns a clone of the value if present and not yet expired.
    ///
    /// Never mutates: an expired entry stays in place until a write path or
    /// the sweep removes it.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let state = self.state.read();
        let entry = state.entries.get(key)?;
        if entry.is_expired() {
            return None;
        }
        Some(entry.value.clone())
    }

    // == Delete ==
    /// Removes an entry by key; returns whether one was present.
    pub fn delete(&self, key: &str) -> bool {
        self.state.write().remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry and resets the memory total.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.memory_bytes = 0;
    }

    // == Sweep ==
    /// Removes every expired entry; returns the number removed.
    pub fn sweep(&self) -> usize {
        let removed = self.state.write().purge_expired(Instant::now());
        debug!("Cache sweep removed {} expired entries", removed);
        removed
    }

    // == Stats ==
    /// Returns an occupancy snapshot without touching any entry.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();
        let now = Instant::now();
        let expired = state
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .count();

        CacheStats::new(
            state.entries.len(),
            expired,
            state.memory_bytes,
            self.max_memory_bytes,
        )
    }

    // == Accessors ==
    /// Returns the number of entries physically present.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Returns the running memory total in bytes.
    pub fn memory_used_bytes(&self) -> usize {
        self.state.read().memory_bytes
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn max_memory_bytes(&self) -> usize {
        self.max_memory_bytes
    }

    /// Sums the stored entry sizes from scratch.
    #[cfg(test)]
    pub(crate) fn recomputed_memory_bytes(&self) -> usize {
        self.state.read().entries.values().map(|entry| entry.size).sum()
    }
}
