//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Per-store enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CachingEnabled {
    pub query_cache: bool,
    pub metadata_cache: bool,
}

/// Per-store default TTLs in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheTtl {
    pub query_cache_ttl: u64,
    pub metadata_cache_ttl: u64,
}

/// Response body for the stats endpoint (GET /api/cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub caching_enabled: CachingEnabled,
    pub cache_ttl: CacheTtl,
    pub query_cache: CacheStats,
    pub metadata_cache: CacheStats,
}

/// Response body for the clear endpoint (POST /api/cache/clear)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// Names of the stores that were cleared
    pub cleared: Vec<&'static str>,
}

impl ClearResponse {
    /// Creates a new ClearResponse
    pub fn new(cleared: Vec<&'static str>) -> Self {
        Self {
            message: format!("Cleared {}", cleared.join(", ")),
            cleared,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
