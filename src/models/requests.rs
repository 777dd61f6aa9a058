//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming query parameters.

use serde::Deserialize;

/// Query parameters of the clear operation (POST /api/cache/clear)
///
/// # Fields
/// - `cache`: Optional store name; both stores are cleared when absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearParams {
    #[serde(default)]
    pub cache: Option<String>,
}
