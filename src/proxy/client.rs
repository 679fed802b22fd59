//! Bounded upstream HTTP client.
//!
//! # Responsibilities
//! - Dispatch one outbound request per inbound request
//! - Enforce the overall request timeout and the redirect cap
//! - Classify transport failures into [`ForwardOutcome`] variants
//!
//! # Design Decisions
//! - Certificate validation is disabled; self-signed targets are reachable
//! - System proxy variables are ignored; targets are dialed directly
//! - Exposed through [`UpstreamClient`] so the forwarder can be tested without
//!   a network

use std::fmt;
use std::io;
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use futures_util::{future::BoxFuture, stream::BoxStream, FutureExt, StreamExt, TryStreamExt};
use url::Url;

/// Streamed upstream body. Dropping it releases the upstream connection.
pub type UpstreamBody = BoxStream<'static, Result<Bytes, io::Error>>;

/// Streamed inbound body, passed to the target chunk by chunk.
pub type OutboundBody = BoxStream<'static, Result<Bytes, io::Error>>;

/// Request to send to the target.
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` when the inbound request carried no body.
    pub body: Option<OutboundBody>,
}

impl fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Upstream response whose body has not been read yet.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

impl fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Classified result of a single outbound attempt.
#[derive(Debug)]
pub enum ForwardOutcome {
    Success(UpstreamResponse),
    Timeout,
    Unreachable(String),
    TooManyRedirects(String),
    Internal(String),
}

/// Capability to perform an outbound call.
pub trait UpstreamClient: Send + Sync {
    fn dispatch(&self, request: OutboundRequest) -> BoxFuture<'_, ForwardOutcome>;
}

/// Policy of the forwarding client, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    /// Upper bound for the whole exchange, body included.
    pub request_timeout: Duration,
    /// Redirect hops followed before the request is abandoned.
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_redirects: 2,
        }
    }
}

/// Redirect cap violation, surfaced through the reqwest error chain.
#[derive(Debug)]
struct RedirectLimit(usize);

impl fmt::Display for RedirectLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "too many ({}) redirects", self.0)
    }
}

impl std::error::Error for RedirectLimit {}

/// Production [`UpstreamClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ForwardingClient {
    inner: reqwest::Client,
}

impl ForwardingClient {
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let max_redirects = config.max_redirects;
        let redirect = reqwest::redirect::Policy::custom(move |attempt| {
            // `previous` includes the original URL, so its length equals the
            // number of hops taken once this redirect is followed.
            if attempt.previous().len() > max_redirects {
                attempt.error(RedirectLimit(max_redirects))
            } else {
                attempt.follow()
            }
        });

        let inner = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(config.request_timeout)
            .redirect(redirect)
            .no_proxy()
            .build()?;

        Ok(Self { inner })
    }

    async fn send(&self, request: OutboundRequest) -> ForwardOutcome {
        let mut builder = self
            .inner
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(reqwest::Body::wrap_stream(body));
        }

        let result = builder.send().await;

        match result {
            Ok(response) => ForwardOutcome::Success(UpstreamResponse {
                status: response.status(),
                headers: response.headers().clone(),
                body: response.bytes_stream().map_err(io::Error::other).boxed(),
            }),
            Err(err) => classify(err),
        }
    }
}

impl UpstreamClient for ForwardingClient {
    fn dispatch(&self, request: OutboundRequest) -> BoxFuture<'_, ForwardOutcome> {
        self.send(request).boxed()
    }
}

fn classify(err: reqwest::Error) -> ForwardOutcome {
    if err.is_timeout() {
        ForwardOutcome::Timeout
    } else if err.is_redirect() {
        ForwardOutcome::TooManyRedirects(error_chain(&err))
    } else if err.is_builder() {
        ForwardOutcome::Internal(error_chain(&err))
    } else {
        ForwardOutcome::Unreachable(error_chain(&err))
    }
}

/// Render an error with its sources, e.g. `error sending request: connection refused`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
