#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use tourflow_api::auth::jwt::{generate_access_token, JwtConfig};
use tourflow_api::config::ServerConfig;
use tourflow_api::router::build_app_router;
use tourflow_api::state::AppState;
use tourflow_db::store::{MemoryTourStore, TourStore};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        reconcile_interval_secs: 300,
        public_api_url: "https://api.example.com/api/v1".to_string(),
        widget_version: "1.0.6".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// A router over an in-memory store, plus a handle on that store for
/// seeding and fault injection.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryTourStore>,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers, backed by
/// a fresh [`MemoryTourStore`].
pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryTourStore::new());
    let dyn_store: Arc<dyn TourStore> = store.clone();
    let config = test_config();
    let state = AppState::new(dyn_store, config.clone());

    TestApp {
        router: build_app_router(state, &config),
        store,
    }
}

/// A valid access token for `owner`.
pub fn token_for(owner: Uuid) -> String {
    generate_access_token(owner, Some("owner@example.com"), &test_config().jwt).unwrap()
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post(app: Router, uri: &str, token: Option<&str>) -> Response {
    send(app, Method::POST, uri, token, None).await
}

pub async fn post_json(app: Router, uri: &str, token: Option<&str>, body: Value) -> Response {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, token: Option<&str>, body: Value) -> Response {
    send(app, Method::PUT, uri, token, Some(body)).await
}

pub async fn delete(app: Router, uri: &str, token: Option<&str>) -> Response {
    send(app, Method::DELETE, uri, token, None).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A create-tour body with `steps` steps titled `S1..Sn`.
pub fn tour_body(title: &str, steps: usize) -> Value {
    let steps: Vec<Value> = (1..=steps)
        .map(|i| json!({"title": format!("S{i}"), "description": format!("Body {i}")}))
        .collect();
    json!({"title": title, "description": "Walkthrough", "steps": steps})
}

/// Create a tour over HTTP and return its id.
pub async fn create_tour(app: &TestApp, token: &str, title: &str, steps: usize) -> i64 {
    let response = post_json(app.app(), "/api/v1/tours", Some(token), tour_body(title, steps)).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Step ids of a tour in display order.
pub async fn step_ids(app: &TestApp, token: &str, tour_id: i64) -> Vec<i64> {
    let response = get(app.app(), &format!("/api/v1/tours/{tour_id}/steps"), Some(token)).await;
    body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect()
}
