//! Cache-Aware Execution
//!
//! Wraps the database call of the query and metadata paths: classify, key,
//! look up, run on a miss, and store when the result qualifies.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::CacheStore;
use crate::query::{CacheKey, Classifier, DatabaseRole, QueryResult};

/// Row ceiling above which a result is not cached.
pub const DEFAULT_MAX_CACHEABLE_ROWS: usize = 10_000;

// == Cache Status ==
/// How a request was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// Served from the cache; the database was not touched
    Hit,
    /// Ran against the database; `stored` tells whether the result was cached
    Miss { stored: bool },
    /// Cache not consulted (disabled or statement not cacheable)
    Bypass,
}

/// A value together with how it was obtained.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

// == Query Executor ==
/// Query-result caching in front of a statement runner.
#[derive(Debug, Clone)]
pub struct CachingExecutor {
    store: Arc<CacheStore<Arc<QueryResult>>>,
    classifier: Classifier,
    enabled: bool,
    max_cacheable_rows: usize,
}

impl CachingExecutor {
    pub fn new(
        store: Arc<CacheStore<Arc<QueryResult>>>,
        classifier: Classifier,
        enabled: bool,
        max_cacheable_rows: usize,
    ) -> Self {
        Self {
            store,
            classifier,
            enabled,
            max_cacheable_rows,
        }
    }

    /// True when `sql` would be looked up in the cache.
    pub fn is_cacheable(&self, sql: &str) -> bool {
        self.enabled && self.classifier.is_cacheable(sql)
    }

    /// Runs `sql` through the cache.
    ///
    /// On a hit `run` is never called. On a miss the result of `run` is
    /// stored only if its row count does not exceed the configured ceiling.
    /// Errors from `run` are returned as-is and nothing is cached.
    pub async fn execute<F, Fut, E>(
        &self,
        sql: &str,
        connection: &str,
        role: &DatabaseRole,
        run: F,
    ) -> Result<Cached<Arc<QueryResult>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<QueryResult, E>>,
    {
        if !self.is_cacheable(sql) {
            let result = run().await?;
            return Ok(Cached {
                value: Arc::new(result),
                status: CacheStatus::Bypass,
            });
        }

        let key = CacheKey::for_query(sql, connection, role);
        if let Some(result) = self.store.get(key.as_str()) {
            debug!("Query cache hit: key={} role={}", key, role);
            return Ok(Cached {
                value: result,
                status: CacheStatus::Hit,
            });
        }

        let result = Arc::new(run().await?);
        let stored = if result.rows_count() > self.max_cacheable_rows {
            debug!(
                "Query result not cached: {} rows exceeds ceiling of {}",
                result.rows_count(),
                self.max_cacheable_rows
            );
            false
        } else {
            self.store
                .set(key.into_string(), Arc::clone(&result), Duration::ZERO)
                .is_stored()
        };

        Ok(Cached {
            value: result,
            status: CacheStatus::Miss { stored },
        })
    }
}

// == Metadata Fetcher ==
/// Metadata caching (schemas, object lists, table info) in front of a fetcher.
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    store: Arc<CacheStore<Value>>,
    enabled: bool,
}

impl MetadataFetcher {
    pub fn new(store: Arc<CacheStore<Value>>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Returns the cached metadata for `(category, connection, role, parts)`
    /// or fetches and stores it.
    pub async fn fetch<F, Fut, E>(
        &self,
        category: &str,
        connection: &str,
        role: &DatabaseRole,
        parts: &[&str],
        fetch: F,
    ) -> Result<Cached<Value>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if !self.enabled {
            return Ok(Cached {
                value: fetch().await?,
                status: CacheStatus::Bypass,
            });
        }

        let key = CacheKey::for_metadata(category, connection, role, parts);
        if let Some(value) = self.store.get(key.as_str()) {
            debug!("Metadata cache hit: category={} role={}", category, role);
            return Ok(Cached {
                value,
                status: CacheStatus::Hit,
            });
        }

        let value = fetch().await?;
        let stored = self
            .store
            .set(key.into_string(), value.clone(), Duration::ZERO)
            .is_stored();

        Ok(Cached {
            value,
            status: CacheStatus::Miss { stored },
        })
    }
}
