//! Streaming relay of the upstream body to the caller.
//!
//! The handler returns before the body is written, so the outcome of a
//! forward is only known once the server stops polling the body. [`RelayBody`]
//! wraps the upstream stream and settles the request exactly once:
//!
//! ```text
//! end of stream / declared length reached  → success
//! upstream read error                      → error
//! dropped early (caller went away)         → error
//! ```

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::http::{Method, StatusCode};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::observability::metrics::ProxyMetrics;
use crate::proxy::client::UpstreamBody;
use crate::proxy::error::ProxyError;

/// Bookkeeping for one relayed response. Settles on drop if nothing else did.
pub struct RelayRecord {
    metrics: Arc<dyn ProxyMetrics>,
    method: Method,
    target: String,
    status: StatusCode,
    started: Instant,
    bytes: u64,
    settled: bool,
}

impl RelayRecord {
    pub fn new(
        metrics: Arc<dyn ProxyMetrics>,
        method: Method,
        target: String,
        status: StatusCode,
        started: Instant,
    ) -> Self {
        Self {
            metrics,
            method,
            target,
            status,
            started,
            bytes: 0,
            settled: false,
        }
    }

    /// Record the forward as successful.
    pub fn complete(&mut self) {
        if self.settled {
            return;
        }
        self.settled = true;
        self.metrics.increment_success();

        tracing::info!(
            method = %self.method,
            target = %self.target,
            status = self.status.as_u16(),
            bytes = self.bytes,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Request proxied"
        );
    }

    /// Record the forward as failed while relaying.
    pub fn fail(&mut self, err: &ProxyError) {
        if self.settled {
            return;
        }
        self.settled = true;
        self.metrics.increment_errors();

        tracing::warn!(
            method = %self.method,
            target = %self.target,
            status = self.status.as_u16(),
            bytes = self.bytes,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            error = %err,
            "Relaying response body failed"
        );
    }
}

impl Drop for RelayRecord {
    fn drop(&mut self) {
        if !self.settled {
            self.fail(&ProxyError::Relay(
                "response body was dropped before it was fully relayed".to_string(),
            ));
        }
    }
}

/// Upstream body stream that settles its [`RelayRecord`].
pub struct RelayBody {
    inner: Option<UpstreamBody>,
    expected_len: Option<u64>,
    record: RelayRecord,
}

impl RelayBody {
    /// `expected_len` is the upstream `Content-Length`, when declared. The
    /// server stops polling once that many bytes were written, so reaching it
    /// counts as completion.
    pub fn new(inner: UpstreamBody, expected_len: Option<u64>, record: RelayRecord) -> Self {
        Self {
            inner: Some(inner),
            expected_len,
            record,
        }
    }
}

impl Stream for RelayBody {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.record.bytes += chunk.len() as u64;
                if this.expected_len.is_some_and(|len| this.record.bytes >= len) {
                    this.record.complete();
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => {
                // Release the upstream connection right away.
                this.inner = None;
                this.record.fail(&ProxyError::Relay(err.to_string()));
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.inner = None;
                this.record.complete();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::tests::FakeMetrics;
    use futures_util::stream;

    fn record(metrics: &Arc<FakeMetrics>) -> RelayRecord {
        RelayRecord::new(
            metrics.clone(),
            Method::GET,
            "http://example.com".to_string(),
            StatusCode::OK,
            Instant::now(),
        )
    }

    fn chunks(parts: &[&'static str]) -> UpstreamBody {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok::<_, io::Error>(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
        .boxed()
    }

    #[tokio::test]
    async fn drained_body_counts_success_once() {
        let metrics = Arc::new(FakeMetrics::default());
        let body = RelayBody::new(chunks(&["ab", "cd"]), None, record(&metrics));

        let collected: Vec<_> = body.collect().await;

        assert_eq!(collected.len(), 2);
        assert_eq!(metrics.counts(), (1, 0, 0));
    }

    #[tokio::test]
    async fn declared_length_completes_without_end_of_stream() {
        let metrics = Arc::new(FakeMetrics::default());
        let mut body = RelayBody::new(chunks(&["ab", "cd"]), Some(4), record(&metrics));

        body.next().await.unwrap().unwrap();
        assert_eq!(metrics.counts(), (0, 0, 0));
        body.next().await.unwrap().unwrap();
        drop(body);

        assert_eq!(metrics.counts(), (1, 0, 0));
    }

    #[tokio::test]
    async fn upstream_error_counts_error() {
        let metrics = Arc::new(FakeMetrics::default());
        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
        ])
        .boxed();
        let mut body = RelayBody::new(failing, None, record(&metrics));

        assert!(body.next().await.unwrap().is_ok());
        assert!(body.next().await.unwrap().is_err());
        assert!(body.next().await.is_none());
        drop(body);

        assert_eq!(metrics.counts(), (0, 0, 1));
    }

    #[tokio::test]
    async fn early_drop_counts_error() {
        let metrics = Arc::new(FakeMetrics::default());
        let mut body = RelayBody::new(chunks(&["ab", "cd"]), None, record(&metrics));

        body.next().await.unwrap().unwrap();
        drop(body);

        assert_eq!(metrics.counts(), (0, 0, 1));
    }
}
