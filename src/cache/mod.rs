//! Cache Module
//!
//! In-memory storage with TTL expiration, item- and memory-bounded eviction,
//! and approximate size accounting.

mod entry;
mod size;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use size::{record_size, sequence_size, EstimateSize};
pub use stats::{CacheStats, BYTES_PER_MB};
pub use store::{CacheStore, SetOutcome};

// == Public Constants ==
/// Item ceiling applied to memory-bounded stores
pub const DEFAULT_MAX_ITEMS: usize = 10_000;

/// Interval between background sweeps
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
