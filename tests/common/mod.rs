//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse, Redirect},
    routing::{any, get},
    Json, Router,
};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use http_proxy_daemon::config::ProxyConfig;
use http_proxy_daemon::lifecycle::shutdown::{drain, DrainError};
use http_proxy_daemon::{CounterStore, HttpServer, Shutdown};

/// Proxy running on an ephemeral port.
#[allow(dead_code)]
pub struct TestProxy {
    pub addr: SocketAddr,
    pub counters: Arc<CounterStore>,
    shutdown: Shutdown,
    task: JoinHandle<std::io::Result<()>>,
}

#[allow(dead_code)]
impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait up to `grace` for the server to drain.
    pub async fn stop(self, grace: Duration) -> Result<std::io::Result<()>, DrainError> {
        self.shutdown.trigger();
        drain(self.task, grace).await
    }
}

/// Start the proxy with the production upstream client.
pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let server = HttpServer::new(config).unwrap();
    let counters = server.counters();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestProxy {
        addr,
        counters,
        shutdown,
        task,
    }
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query().unwrap_or(""),
        "x_test": header("x-test"),
        "host": header("host"),
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn cookies() -> impl IntoResponse {
    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "https://upstream.example")],
        AppendHeaders([(header::SET_COOKIE, "a=1"), (header::SET_COOKIE, "b=2")]),
        "cookies",
    )
}

/// Reads the body as a stream and answers `<length>:<byte sum>`.
async fn digest(body: Body) -> String {
    let mut stream = body.into_data_stream();
    let (mut len, mut sum) = (0u64, 0u64);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        len += chunk.len() as u64;
        sum += chunk.iter().map(|b| u64::from(*b)).sum::<u64>();
    }
    format!("{len}:{sum}")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(300)).await;
    "slow"
}

/// Start an upstream with echo, redirect and slow endpoints.
#[allow(dead_code)]
pub async fn start_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/cookies", get(cookies))
        .route("/digest", any(digest))
        .route("/slow", get(slow))
        .route("/loop", get(|| async { Redirect::temporary("/loop") }))
        .route("/hop/1", get(|| async { Redirect::temporary("/hop/2") }))
        .route("/hop/2", get(|| async { Redirect::temporary("/echo") }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "missing") }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a backend that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Poll `check` until it holds or a second passes.
#[allow(dead_code)]
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
