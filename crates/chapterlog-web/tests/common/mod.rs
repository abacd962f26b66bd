#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response, StatusCode};
use chapterlog_core::{Catalog, CatalogConfig, Error, Storage};
use chapterlog_web::{AppState, ServerConfig, app};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Catalog that answers every query with the same records
pub struct FixedCatalog(pub Vec<Value>);

#[async_trait]
impl Catalog for FixedCatalog {
    async fn search(&self, _text: &str, limit: u32) -> chapterlog_core::Result<Vec<Value>> {
        Ok(self.0.iter().take(limit as usize).cloned().collect())
    }
}

/// Catalog that is never reachable
pub struct DownCatalog;

#[async_trait]
impl Catalog for DownCatalog {
    async fn search(&self, _text: &str, _limit: u32) -> chapterlog_core::Result<Vec<Value>> {
        Err(Error::CatalogStatus(503))
    }
}

pub fn jikan_record(id: u64, title: &str, chapters: Option<u32>) -> Value {
    json!({
        "mal_id": id,
        "title": title,
        "type": "Manhwa",
        "chapters": chapters,
        "images": { "jpg": { "image_url": format!("https://cdn.example/{id}.jpg") } }
    })
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        db_path: ":memory:".to_string(),
        static_dir: std::env::temp_dir().join("chapterlog-no-static").to_string_lossy().to_string(),
        session_idle_minutes: 60,
        catalog: CatalogConfig::default().with_base_url("http://127.0.0.1:9"),
    }
}

/// Build the application over an in-memory store and the given catalog.
pub async fn build_test_app(catalog: Arc<dyn Catalog>) -> (Router, AppState) {
    let store = Storage::open_memory().await.unwrap();
    let state = AppState::with_parts(test_config(), Arc::new(store), catalog);
    (app(state.clone()), state)
}

pub async fn build_default_app() -> (Router, AppState) {
    build_test_app(Arc::new(FixedCatalog(vec![
        jikan_record(1, "Solo Leveling", Some(10)),
        jikan_record(2, "Tower of God", None),
    ])))
    .await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub cookie: Option<String>,
    pub body: Value,
}

/// `name=value` part of the session cookie set on a response, if any
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("chapterlog_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn request(
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = session_cookie(&response);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    TestResponse { status, cookie, body }
}

pub async fn get(app: &Router, uri: &str, cookie: &str) -> TestResponse {
    send(app, request(Method::GET, uri, Some(cookie), None)).await
}

pub async fn post(app: &Router, uri: &str, cookie: &str, body: Option<&Value>) -> TestResponse {
    send(app, request(Method::POST, uri, Some(cookie), body)).await
}

/// Open a session and return its cookie.
pub async fn open_session(app: &Router) -> String {
    let response = send(app, request(Method::GET, "/api/session", None, None)).await;
    assert_eq!(response.status, StatusCode::OK);
    response.cookie.expect("session cookie")
}
