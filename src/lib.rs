//! Query Cache - in-process caching layer for a database browsing service
//!
//! Two independent TTL- and memory-bounded stores (query results and
//! metadata), a lexical classifier deciding which statements may be cached,
//! and role-scoped cache keys.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod session;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use session::CacheSession;
pub use tasks::spawn_sweep_task;
