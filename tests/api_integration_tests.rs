//! Integration Tests for the Cache Admin API
//!
//! Drives the query path through a session and checks what the admin
//! endpoints report and clear.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use query_cache::{
    api::create_router,
    query::{CacheStatus, DatabaseRole, QueryResult},
    AppState, Config,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_state() -> AppState {
    AppState::from_config(&Config::default())
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn users_result() -> QueryResult {
    let now = Utc::now();
    QueryResult::new(
        vec!["id".to_string(), "name".to_string()],
        vec![vec![json!(1), json!("alice")], vec![json!(2), json!("bob")]],
        now,
        now,
    )
}

async fn run_query(state: &AppState, sql: &str, role: &str) -> CacheStatus {
    let role = DatabaseRole::parse(role).unwrap();
    state
        .session
        .queries()
        .execute(sql, "postgres://localhost/app", &role, || async {
            Ok::<_, String>(users_result())
        })
        .await
        .unwrap()
        .status
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_shape() {
    let app = create_router(create_state());

    let (status, json) = get_json(&app, "/api/cache/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["caching_enabled"]["query_cache"], json!(true));
    assert_eq!(json["caching_enabled"]["metadata_cache"], json!(true));
    assert_eq!(json["cache_ttl"]["query_cache_ttl"], json!(120));
    assert_eq!(json["cache_ttl"]["metadata_cache_ttl"], json!(600));
    for store in ["query_cache", "metadata_cache"] {
        for field in [
            "total_items",
            "expired_items",
            "active_items",
            "memory_used_mb",
            "memory_limit_mb",
            "memory_used_bytes",
        ] {
            assert!(json[store].get(field).is_some(), "{}.{} missing", store, field);
        }
    }
    assert_eq!(json["query_cache"]["memory_limit_mb"], json!(50));
    assert_eq!(json["metadata_cache"]["memory_limit_mb"], json!(100));
}

#[tokio::test]
async fn test_stats_reflect_cached_queries() {
    let state = create_state();
    let app = create_router(state.clone());

    assert_eq!(
        run_query(&state, "SELECT * FROM users", "").await,
        CacheStatus::Miss { stored: true }
    );
    assert_eq!(run_query(&state, "SELECT * FROM users", "").await, CacheStatus::Hit);
    // A different role gets its own entry.
    assert_eq!(
        run_query(&state, "SELECT * FROM users", "analyst").await,
        CacheStatus::Miss { stored: true }
    );
    assert_eq!(run_query(&state, "SELECT now()", "").await, CacheStatus::Bypass);

    let (_, json) = get_json(&app, "/api/cache/stats").await;
    assert_eq!(json["query_cache"]["total_items"], json!(2));
    assert_eq!(json["query_cache"]["active_items"], json!(2));
    assert!(json["query_cache"]["memory_used_bytes"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_stats_report_disabled_caches() {
    let config = Config {
        query_cache_enabled: false,
        ..Config::default()
    };
    let state = AppState::from_config(&config);
    let app = create_router(state.clone());

    assert_eq!(run_query(&state, "SELECT * FROM users", "").await, CacheStatus::Bypass);

    let (_, json) = get_json(&app, "/api/cache/stats").await;
    assert_eq!(json["caching_enabled"]["query_cache"], json!(false));
    assert_eq!(json["query_cache"]["total_items"], json!(0));
}

// == Clear Endpoint Tests ==

#[tokio::test]
async fn test_clear_endpoint_clears_both() {
    let state = create_state();
    let app = create_router(state.clone());

    run_query(&state, "SELECT * FROM users", "").await;
    let _ = state
        .session
        .metadata_store()
        .set("schemas", json!(["public"]), Duration::ZERO);

    let (status, json) = post_json(&app, "/api/cache/clear").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], json!(["query_cache", "metadata_cache"]));
    assert!(json["message"].is_string());

    let (_, stats) = get_json(&app, "/api/cache/stats").await;
    assert_eq!(stats["query_cache"]["total_items"], json!(0));
    assert_eq!(stats["metadata_cache"]["total_items"], json!(0));
    assert_eq!(stats["query_cache"]["memory_used_bytes"], json!(0));

    // Previously cached statement must hit the database again.
    assert_eq!(
        run_query(&state, "SELECT * FROM users", "").await,
        CacheStatus::Miss { stored: true }
    );
}

#[tokio::test]
async fn test_clear_endpoint_single_store() {
    let state = create_state();
    let app = create_router(state.clone());

    run_query(&state, "SELECT * FROM users", "").await;
    let _ = state
        .session
        .metadata_store()
        .set("schemas", json!(["public"]), Duration::ZERO);

    let (status, json) = post_json(&app, "/api/cache/clear?cache=metadata_cache").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], json!(["metadata_cache"]));
    assert_eq!(state.session.query_store().len(), 1);
    assert!(state.session.metadata_store().is_empty());
}

#[tokio::test]
async fn test_clear_endpoint_unknown_store() {
    let app = create_router(create_state());

    let (status, json) = post_json(&app, "/api/cache/clear?cache=sessions").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("sessions"));
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router(create_state());

    let (status, json) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], json!("healthy"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_router(create_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/cache/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
