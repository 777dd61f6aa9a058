//! API Module
//!
//! HTTP handlers and routing for the cache admin surface.
//!
//! # Endpoints
//! - `GET /api/cache/stats` - Snapshot of both stores
//! - `POST /api/cache/clear` - Clear both stores (or `?cache=<name>`)
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
