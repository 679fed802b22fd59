//! Service endpoints: index page, probes, JSON metrics and fallbacks.

use std::any::Any;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::counters::{PROXIED_ERRORS, PROXIED_SUCCESS};
use crate::http::response::json_error;
use crate::http::server::AppState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>HTTP proxy daemon</title>
</head>
<body>
  <h1>HTTP proxy daemon</h1>
  <p>Forward a request with <code>/&lt;prefix&gt;/[http|https/]&lt;host&gt;/&lt;path&gt;?&lt;query&gt;</code>.</p>
  <ul>
    <li><a href="/metrics">/metrics</a></li>
    <li><a href="/live">/live</a></li>
    <li><a href="/ready">/ready</a></li>
  </ul>
</body>
</html>
"#;

/// Payload of `GET /metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub proxied_success: i64,
    pub proxied_errors: i64,
    pub uptime_sec: u64,
    pub hostname: String,
    pub version: String,
}

impl MetricsSnapshot {
    pub fn collect(state: &AppState) -> Self {
        let counters = state.counters.snapshot();
        let count = |name: &str| counters.get(name).copied().unwrap_or(0);

        Self {
            proxied_success: count(PROXIED_SUCCESS),
            proxied_errors: count(PROXIED_ERRORS),
            uptime_sec: uptime(state.started_at),
            hostname: state.hostname.to_string(),
            version: VERSION.to_string(),
        }
    }
}

fn uptime(started_at: Instant) -> u64 {
    started_at.elapsed().as_secs()
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn live() -> &'static str {
    "OK"
}

pub async fn ready() -> &'static str {
    "OK"
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")],
        Json(MetricsSnapshot::collect(&state)),
    )
}

pub async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Not Found")
}

pub async fn method_not_allowed() -> Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Turns a handler panic into a JSON 500.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!(panic = %detail, "Handler panicked");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// Host name reported by `/metrics`.
pub fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .unwrap_or_default()
}
