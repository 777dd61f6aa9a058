//! Configuration Module
//!
//! Loads cache and server settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::{BYTES_PER_MB, DEFAULT_MAX_ITEMS, DEFAULT_SWEEP_INTERVAL_SECS};
use crate::error::{CacheError, Result};
use crate::query::DEFAULT_MAX_CACHEABLE_ROWS;

/// Prefix expected on every environment variable.
pub const ENV_PREFIX: &str = "PGWEB_";

/// Cache and server configuration.
///
/// All values can be configured via environment variables with defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether query results are cached
    pub query_cache_enabled: bool,
    /// Whether metadata lookups are cached
    pub metadata_cache_enabled: bool,
    /// Query cache TTL in seconds
    pub query_cache_ttl: u64,
    /// Metadata cache TTL in seconds
    pub metadata_cache_ttl: u64,
    /// Query cache memory bound in megabytes
    pub query_cache_max_memory_mb: usize,
    /// Metadata cache memory bound in megabytes
    pub metadata_cache_max_memory_mb: usize,
    /// Item ceiling per store (0 = unlimited)
    pub cache_max_items: usize,
    /// Results with more rows than this are not cached
    pub max_cacheable_rows: usize,
    /// Interval between background sweeps in seconds
    pub sweep_interval: u64,
    /// Extra deny-listed functions for the classifier
    pub extra_deny_functions: Vec<String>,
    /// HTTP listen port of the admin surface
    pub listen_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// Each name is read with the `PGWEB_` prefix first; the bare name is
    /// still honoured but logs a deprecation warning.
    /// - `DISABLE_QUERY_CACHE` - `true`/`1` disables query caching
    /// - `DISABLE_METADATA_CACHE` - `true`/`1` disables metadata caching
    /// - `QUERY_CACHE_TTL` - seconds (default: 120)
    /// - `METADATA_CACHE_TTL` - seconds (default: 600)
    /// - `QUERY_CACHE_MAX_MEMORY_MB` - (default: 50)
    /// - `METADATA_CACHE_MAX_MEMORY_MB` - (default: 100)
    /// - `CACHE_MAX_ITEMS` - (default: 10000)
    /// - `QUERY_CACHE_MAX_ROWS` - (default: 10000)
    /// - `CACHE_SWEEP_INTERVAL` - seconds (default: 300)
    /// - `CACHE_DENY_FUNCTIONS` - comma-separated function names
    /// - `LISTEN_PORT` - (default: 8081)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = PrefixedVars { lookup };
        let defaults = Self::default();

        Self {
            query_cache_enabled: !vars.flag("DISABLE_QUERY_CACHE"),
            metadata_cache_enabled: !vars.flag("DISABLE_METADATA_CACHE"),
            query_cache_ttl: vars.parse("QUERY_CACHE_TTL", defaults.query_cache_ttl),
            metadata_cache_ttl: vars.parse("METADATA_CACHE_TTL", defaults.metadata_cache_ttl),
            query_cache_max_memory_mb: vars
                .parse("QUERY_CACHE_MAX_MEMORY_MB", defaults.query_cache_max_memory_mb),
            metadata_cache_max_memory_mb: vars
                .parse("METADATA_CACHE_MAX_MEMORY_MB", defaults.metadata_cache_max_memory_mb),
            cache_max_items: vars.parse("CACHE_MAX_ITEMS", defaults.cache_max_items),
            max_cacheable_rows: vars.parse("QUERY_CACHE_MAX_ROWS", defaults.max_cacheable_rows),
            sweep_interval: vars.parse("CACHE_SWEEP_INTERVAL", defaults.sweep_interval),
            extra_deny_functions: vars
                .get("CACHE_DENY_FUNCTIONS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            listen_port: vars.parse("LISTEN_PORT", defaults.listen_port),
        }
    }

    /// Rejects values the caches cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "cache sweep interval must be greater than zero".to_string(),
            ));
        }
        if self.query_cache_ttl == 0 || self.metadata_cache_ttl == 0 {
            return Err(CacheError::InvalidConfig(
                "cache TTL must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn query_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.query_cache_ttl)
    }

    pub fn metadata_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.metadata_cache_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    /// Query cache memory bound in bytes, saturating on absurd megabyte values.
    pub fn query_cache_max_memory_bytes(&self) -> usize {
        self.query_cache_max_memory_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Metadata cache memory bound in bytes, saturating on absurd megabyte values.
    pub fn metadata_cache_max_memory_bytes(&self) -> usize {
        self.metadata_cache_max_memory_mb.saturating_mul(BYTES_PER_MB)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query_cache_enabled: true,
            metadata_cache_enabled: true,
            query_cache_ttl: 120,
            metadata_cache_ttl: 600,
            query_cache_max_memory_mb: 50,
            metadata_cache_max_memory_mb: 100,
            cache_max_items: DEFAULT_MAX_ITEMS,
            max_cacheable_rows: DEFAULT_MAX_CACHEABLE_ROWS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL_SECS,
            extra_deny_functions: Vec::new(),
            listen_port: 8081,
        }
    }
}

/// Prefixed lookup with a deprecated unprefixed fallback.
struct PrefixedVars<F> {
    lookup: F,
}

impl<F> PrefixedVars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        let prefixed = format!("{}{}", ENV_PREFIX, name);
        if let Some(value) = (self.lookup)(&prefixed).filter(|v| !v.is_empty()) {
            return Some(value);
        }

        let value = (self.lookup)(name).filter(|v| !v.is_empty())?;
        warn!(
            "Usage of {} env var is deprecated, please use {} instead",
            name, prefixed
        );
        Some(value)
    }

    fn flag(&self, name: &str) -> bool {
        matches!(self.get(name).as_deref(), Some("true") | Some("1"))
    }

    fn parse<T: FromStr>(&self, name: &str, default: T) -> T {
        match self.get(name) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid value {:?} for {}, using default", raw, name);
                default
            }),
            None => default,
        }
    }
}
