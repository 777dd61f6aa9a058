//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A stored value together with its absolute expiration and estimated footprint.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Absolute expiration instant
    pub expires_at: Instant,
    /// Estimated size in bytes, fixed at insertion
    pub size: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` after `now`.
    pub fn new_at(value: V, now: Instant, ttl: Duration, size: usize) -> Self {
        Self {
            value,
            expires_at: now + ttl,
            size,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so an
    /// entry is never served at the exact instant its TTL elapses.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Checks if the entry has expired against the current clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new_at("test_value".to_string(), now, Duration::from_secs(60), 26);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.size, 26);
        assert_eq!(entry.expires_at, now + Duration::from_secs(60));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new_at("test_value", Instant::now(), Duration::from_millis(30), 8);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(50));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let now = Instant::now();
        let entry = CacheEntry::new_at((), now, Duration::ZERO, 8);
        assert!(entry.is_expired_at(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry {
            value: "test",
            expires_at: now,
            size: 8,
        };

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - Duration::from_millis(1)));
    }
}
