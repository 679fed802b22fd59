//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, panic recovery)
//! - Capture the target route under the configured prefix
//! - Bind server to listener and stop on the shutdown signal

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::{get, on, MethodFilter, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::counters::CounterStore;
use crate::http::handlers;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics::CounterMetrics;
use crate::proxy::{ForwardingClient, RequestForwarder, UpstreamClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<RequestForwarder>,
    pub counters: Arc<CounterStore>,
    pub route: Arc<ProxyRoute>,
    pub hostname: Arc<str>,
    pub started_at: Instant,
}

/// Location of the proxy route: `/<prefix>/<captured>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    prefix: String,
}

impl ProxyRoute {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Everything after `/<prefix>/`, exactly as it appears in the raw path.
    pub fn capture<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix('/')?
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('/')
    }

    fn root_path(&self) -> String {
        format!("/{}/", self.prefix)
    }

    fn wildcard_path(&self) -> String {
        format!("/{}/{{*uri}}", self.prefix)
    }
}

/// HTTP server for the proxy daemon.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    counters: Arc<CounterStore>,
}

impl HttpServer {
    /// Create a server that forwards through the production client.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = ForwardingClient::new(config.proxy.client_config())?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create a server around any upstream client.
    pub fn with_client(config: ProxyConfig, client: Arc<dyn UpstreamClient>) -> Self {
        let counters = Arc::new(CounterStore::new());
        let metrics = Arc::new(CounterMetrics::new(counters.clone()));
        let forwarder = RequestForwarder::new(client, metrics);

        let state = AppState {
            forwarder: Arc::new(forwarder),
            counters: counters.clone(),
            route: Arc::new(ProxyRoute::new(&config.proxy.prefix)),
            hostname: handlers::hostname().into(),
            started_at: Instant::now(),
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            counters,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let route = state.route.clone();

        Router::new()
            .route("/", get(handlers::index))
            .route("/live", get(handlers::live))
            .route("/ready", get(handlers::ready))
            .route("/metrics", get(handlers::metrics))
            .route(&route.root_path(), proxy_route())
            .route(&route.wildcard_path(), proxy_route())
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(CatchPanicLayer::custom(handlers::panic_response))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request_id(request.headers()).unwrap_or("-"),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// Router with state and middleware, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Counters shared with the `/metrics` endpoint.
    pub fn counters(&self) -> Arc<CounterStore> {
        self.counters.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain open connections.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.proxy.prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn proxy_methods() -> MethodFilter {
    MethodFilter::GET
        .or(MethodFilter::HEAD)
        .or(MethodFilter::POST)
        .or(MethodFilter::PUT)
        .or(MethodFilter::PATCH)
        .or(MethodFilter::DELETE)
        .or(MethodFilter::OPTIONS)
}

fn proxy_route() -> MethodRouter<AppState> {
    on(proxy_methods(), proxy_handler).fallback(handlers::method_not_allowed)
}

/// Forward the captured route to its target.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let captured = state
        .route
        .capture(request.uri().path())
        .map(str::to_owned);

    state.forwarder.forward(captured.as_deref(), request).await
}
