//! Request forwarding state machine.
//!
//! # States
//! ```text
//! ExtractRoute → Resolve → BuildTarget → BuildOutbound → Dispatch → Relay → Done
//!       │                       │              │             │         │
//!       └───────────────────────┴──────────────┴─────────────┴─────────┴──→ Failed
//! ```
//!
//! Every request settles exactly one counter: failures before the relay are
//! recorded here, the relay outcome is recorded by [`RelayRecord`].

use std::io;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, HeaderName, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{StreamExt, TryStreamExt};
use url::Url;

use crate::http::response::{is_hop_by_hop, relay_headers};
use crate::observability::metrics::ProxyMetrics;
use crate::proxy::client::{ForwardOutcome, OutboundRequest, UpstreamClient, UpstreamResponse};
use crate::proxy::error::ProxyError;
use crate::proxy::relay::{RelayBody, RelayRecord};
use crate::proxy::target::ResolvedTarget;

/// Forwards one inbound request to the target encoded in its route.
pub struct RequestForwarder {
    client: Arc<dyn UpstreamClient>,
    metrics: Arc<dyn ProxyMetrics>,
}

impl RequestForwarder {
    pub fn new(client: Arc<dyn UpstreamClient>, metrics: Arc<dyn ProxyMetrics>) -> Self {
        Self { client, metrics }
    }

    /// Run the whole pipeline for one request.
    ///
    /// `captured` is the route segment after the proxy prefix; `None` means
    /// the router could not supply it.
    pub async fn forward(&self, captured: Option<&str>, request: Request<Body>) -> Response {
        let started = Instant::now();
        let method = request.method().clone();

        match self.try_forward(captured, request, started).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_upstream_failure() {
                    self.metrics.increment_failed();
                } else {
                    self.metrics.increment_errors();
                }

                tracing::warn!(
                    method = %method,
                    route = captured.unwrap_or("-"),
                    status = err.status_code().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "Proxy request failed"
                );

                err.into_response()
            }
        }
    }

    async fn try_forward(
        &self,
        captured: Option<&str>,
        request: Request<Body>,
        started: Instant,
    ) -> Result<Response, ProxyError> {
        let captured = captured.ok_or(ProxyError::MissingRoute)?;

        let target = ResolvedTarget::decompose(captured);
        if target.path.is_empty() {
            return Err(ProxyError::EmptyPath);
        }

        let target_uri = target
            .target_uri(request.uri().query())
            .ok_or(ProxyError::InvalidTarget)?;

        let outbound = build_outbound(&target_uri, request)?;
        let method = outbound.method.clone();

        tracing::debug!(method = %method, target = %target_uri, "Dispatching upstream request");

        match self.client.dispatch(outbound).await {
            ForwardOutcome::Success(upstream) => Ok(self.relay(method, target_uri, upstream, started)),
            ForwardOutcome::Timeout => Err(ProxyError::Timeout),
            ForwardOutcome::Unreachable(reason) => Err(ProxyError::Unreachable(reason)),
            ForwardOutcome::TooManyRedirects(reason) => Err(ProxyError::TooManyRedirects(reason)),
            ForwardOutcome::Internal(reason) => Err(ProxyError::Internal(reason)),
        }
    }

    fn relay(
        &self,
        method: Method,
        target: String,
        upstream: UpstreamResponse,
        started: Instant,
    ) -> Response {
        let UpstreamResponse {
            status,
            headers,
            body,
        } = upstream;

        let declared_len = content_length(&headers);
        let mut record = RelayRecord::new(self.metrics.clone(), method.clone(), target, status, started);

        let body = if carries_no_body(&method, status) || declared_len == Some(0) {
            drop(body);
            record.complete();
            Body::empty()
        } else {
            Body::from_stream(RelayBody::new(body, declared_len, record))
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = relay_headers(&headers);
        response
    }
}

/// Outbound request carrying the inbound method, headers and streamed body.
fn build_outbound(target_uri: &str, request: Request<Body>) -> Result<OutboundRequest, ProxyError> {
    let url = Url::parse(target_uri)
        .map_err(|e| ProxyError::BuildRequest(format!("invalid target URI {target_uri:?}: {e}")))?;

    let (parts, body) = request.into_parts();
    let body = if body.size_hint().exact() == Some(0) {
        None
    } else {
        Some(body.into_data_stream().map_err(io::Error::other).boxed())
    };

    Ok(OutboundRequest {
        method: parts.method,
        url,
        headers: outbound_headers(parts.headers),
        body,
    })
}

/// Inbound headers minus the ones that describe the inbound hop.
fn outbound_headers(mut headers: HeaderMap) -> HeaderMap {
    let dropped: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_hop_by_hop(name))
        .cloned()
        .collect();
    for name in dropped {
        headers.remove(&name);
    }

    // Recomputed by the client for the target. A declared Content-Length
    // stays so the streamed body keeps fixed-length framing.
    headers.remove(header::HOST);
    headers
}

fn carries_no_body(method: &Method, status: StatusCode) -> bool {
    method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
