//! Cache Statistics Module
//!
//! Read-only occupancy and memory snapshot of a single store.

use serde::Serialize;

/// Bytes per megabyte used for every MB figure reported.
pub const BYTES_PER_MB: usize = 1024 * 1024;

// == Cache Stats ==
/// Point-in-time snapshot of a store.
///
/// Megabyte figures are whole megabytes (integer division), matching the
/// shape consumed by the admin surface; `memory_used_bytes` carries the
/// exact running total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries physically present, including expired ones awaiting sweep
    pub total_items: usize,
    /// Entries past expiration that have not been removed yet
    pub expired_items: usize,
    /// Entries still servable (`total_items - expired_items`)
    pub active_items: usize,
    /// Current estimated memory usage in whole megabytes
    pub memory_used_mb: usize,
    /// Configured memory bound in whole megabytes (0 = unlimited)
    pub memory_limit_mb: usize,
    /// Current estimated memory usage in bytes
    pub memory_used_bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Builds a snapshot from raw counts.
    pub fn new(
        total_items: usize,
        expired_items: usize,
        memory_used_bytes: usize,
        memory_limit_bytes: usize,
    ) -> Self {
        Self {
            total_items,
            expired_items,
            active_items: total_items.saturating_sub(expired_items),
            memory_used_mb: memory_used_bytes / BYTES_PER_MB,
            memory_limit_mb: memory_limit_bytes / BYTES_PER_MB,
            memory_used_bytes,
        }
    }
}
