//! Cache Session
//!
//! Owns the query-result and metadata stores together with their sweepers.
//! The two stores are independent: no lock is ever held across both.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::info;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{CacheStatsResponse, CacheTtl, CachingEnabled};
use crate::query::{CachingExecutor, Classifier, MetadataFetcher, QueryResult};
use crate::tasks::{spawn_sweep_task, SweepHandle};

/// Name of the query-result store in reports.
pub const QUERY_CACHE: &str = "query_cache";
/// Name of the metadata store in reports.
pub const METADATA_CACHE: &str = "metadata_cache";

// == Cache Session ==
#[derive(Debug)]
pub struct CacheSession {
    config: Config,
    query_store: Arc<CacheStore<Arc<QueryResult>>>,
    metadata_store: Arc<CacheStore<Value>>,
    executor: CachingExecutor,
    metadata: MetadataFetcher,
    sweepers: Mutex<Vec<SweepHandle>>,
}

impl CacheSession {
    // == Constructor ==
    /// Builds both stores from configuration. Sweepers are not started.
    pub fn new(config: Config) -> Self {
        let query_store = Arc::new(CacheStore::new(
            config.query_cache_ttl(),
            config.cache_max_items,
            config.query_cache_max_memory_bytes(),
        ));
        let metadata_store = Arc::new(CacheStore::new(
            config.metadata_cache_ttl(),
            config.cache_max_items,
            config.metadata_cache_max_memory_bytes(),
        ));

        let classifier =
            Classifier::default().with_extra_functions(config.extra_deny_functions.iter());
        let executor = CachingExecutor::new(
            Arc::clone(&query_store),
            classifier,
            config.query_cache_enabled,
            config.max_cacheable_rows,
        );
        let metadata = MetadataFetcher::new(Arc::clone(&metadata_store), config.metadata_cache_enabled);

        Self {
            config,
            query_store,
            metadata_store,
            executor,
            metadata,
            sweepers: Mutex::new(Vec::new()),
        }
    }

    // == Lifecycle ==
    /// Starts one sweeper per store. Calling it again while running is a
    /// no-op. Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut sweepers = self.sweepers.lock();
        if !sweepers.is_empty() {
            return;
        }

        let interval = self.config.sweep_interval();
        sweepers.push(spawn_sweep_task(
            QUERY_CACHE,
            Arc::clone(&self.query_store),
            interval,
        ));
        sweepers.push(spawn_sweep_task(
            METADATA_CACHE,
            Arc::clone(&self.metadata_store),
            interval,
        ));
        info!("Cache sweepers started with interval of {:?}", interval);
    }

    /// Stops and joins every sweeper.
    pub async fn shutdown(&self) {
        let sweepers = std::mem::take(&mut *self.sweepers.lock());
        for sweeper in sweepers {
            sweeper.stop().await;
        }
    }

    /// True while sweepers are running.
    pub fn is_running(&self) -> bool {
        let sweepers = self.sweepers.lock();
        !sweepers.is_empty() && sweepers.iter().all(|sweeper| !sweeper.is_finished())
    }

    // == Accessors ==
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cache-aware query path.
    pub fn queries(&self) -> &CachingExecutor {
        &self.executor
    }

    /// Cache-aware metadata path.
    pub fn metadata(&self) -> &MetadataFetcher {
        &self.metadata
    }

    pub fn query_store(&self) -> &Arc<CacheStore<Arc<QueryResult>>> {
        &self.query_store
    }

    pub fn metadata_store(&self) -> &Arc<CacheStore<Value>> {
        &self.metadata_store
    }

    // == Reporting ==
    /// Read-only snapshot of both stores.
    pub fn report(&self) -> CacheStatsResponse {
        CacheStatsResponse {
            caching_enabled: CachingEnabled {
                query_cache: self.config.query_cache_enabled,
                metadata_cache: self.config.metadata_cache_enabled,
            },
            cache_ttl: CacheTtl {
                query_cache_ttl: self.config.query_cache_ttl,
                metadata_cache_ttl: self.config.metadata_cache_ttl,
            },
            query_cache: self.query_store.stats(),
            metadata_cache: self.metadata_store.stats(),
        }
    }

    /// Clears both stores; returns the names of the stores cleared.
    pub fn clear_all(&self) -> Vec<&'static str> {
        self.query_store.clear();
        self.metadata_store.clear();
        info!("Cleared {} and {}", QUERY_CACHE, METADATA_CACHE);
        vec![QUERY_CACHE, METADATA_CACHE]
    }

    /// Clears a single store by report name.
    pub fn clear(&self, name: &str) -> Result<Vec<&'static str>> {
        let cleared = match name {
            QUERY_CACHE => {
                self.query_store.clear();
                QUERY_CACHE
            }
            METADATA_CACHE => {
                self.metadata_store.clear();
                METADATA_CACHE
            }
            other => {
                return Err(CacheError::InvalidRequest(format!(
                    "Unknown cache '{}', expected '{}' or '{}'",
                    other, QUERY_CACHE, METADATA_CACHE
                )))
            }
        };
        info!("Cleared {}", cleared);
        Ok(vec![cleared])
    }
}
