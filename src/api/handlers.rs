//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::models::{CacheStatsResponse, ClearParams, ClearResponse, HealthResponse};
use crate::session::CacheSession;

/// Application state shared across all handlers.
///
/// The session synchronizes its stores internally, so handlers share it
/// behind a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Cache session owning both stores
    pub session: Arc<CacheSession>,
}

impl AppState {
    /// Creates a new AppState around an existing session.
    pub fn new(session: CacheSession) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    /// Creates a new AppState from configuration. Sweepers are not started.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheSession::new(config.clone()))
    }
}

/// Handler for GET /api/cache/stats
///
/// Returns a read-only snapshot of both stores.
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(state.session.report())
}

/// Handler for POST /api/cache/clear
///
/// Clears both stores, or only the one named by `?cache=`.
pub async fn clear_handler(
    State(state): State<AppState>,
    Query(params): Query<ClearParams>,
) -> Result<Json<ClearResponse>> {
    let cleared = match params.cache.as_deref() {
        Some(name) => state.session.clear(name)?,
        None => state.session.clear_all(),
    };

    Ok(Json(ClearResponse::new(cleared)))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
