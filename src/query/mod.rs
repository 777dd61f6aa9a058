//! Query Module
//!
//! Everything the query path needs around the stores: cacheability
//! classification, key derivation, role validation, the cached payload and
//! the cache-aware executor.

mod classifier;
mod executor;
mod key;
mod result;
mod role;

pub use classifier::{Classifier, DEFAULT_DENY_LIST};
pub use executor::{
    Cached, CacheStatus, CachingExecutor, MetadataFetcher, DEFAULT_MAX_CACHEABLE_ROWS,
};
pub use key::{normalize_query, CacheKey};
pub use result::{QueryResult, ResultStats, Row};
pub use role::{DatabaseRole, MAX_ROLE_LENGTH};
