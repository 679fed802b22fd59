//! Proxy outcome metrics.
//!
//! # Metrics
//! - `proxied_success` / `proxied_errors` in the [`CounterStore`], served as
//!   JSON by `GET /metrics`
//! - `proxy_requests_total{outcome="success|failed|error"}` through the
//!   `metrics` facade, exported for Prometheus when enabled
//!
//! # Design Decisions
//! - The forwarder only sees the [`ProxyMetrics`] capability
//! - Upstream failures and internal errors both land in `proxied_errors`; the
//!   distinction survives only in the Prometheus `outcome` label

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::counters::{CounterStore, PROXIED_ERRORS, PROXIED_SUCCESS};

pub const REQUESTS_TOTAL: &str = "proxy_requests_total";

/// Sink for the outcome of each forwarded request.
pub trait ProxyMetrics: Send + Sync {
    /// The upstream response was relayed completely.
    fn increment_success(&self);
    /// The upstream timed out, was unreachable or redirected too often.
    fn increment_failed(&self);
    /// The proxy itself or the caller caused the failure.
    fn increment_errors(&self);
}

/// Production metrics sink backed by the shared counter store.
#[derive(Debug, Clone)]
pub struct CounterMetrics {
    counters: Arc<CounterStore>,
}

impl CounterMetrics {
    pub fn new(counters: Arc<CounterStore>) -> Self {
        Self { counters }
    }
}

impl ProxyMetrics for CounterMetrics {
    fn increment_success(&self) {
        self.counters.increment(PROXIED_SUCCESS);
        metrics::counter!(REQUESTS_TOTAL, "outcome" => "success").increment(1);
    }

    fn increment_failed(&self) {
        self.counters.increment(PROXIED_ERRORS);
        metrics::counter!(REQUESTS_TOTAL, "outcome" => "failed").increment(1);
    }

    fn increment_errors(&self) {
        self.counters.increment(PROXIED_ERRORS);
        metrics::counter!(REQUESTS_TOTAL, "outcome" => "error").increment(1);
    }
}

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Proxied requests by outcome.");

    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records calls so tests can assert exactly which counter moved.
    #[derive(Debug, Default)]
    pub struct FakeMetrics {
        success: AtomicUsize,
        failed: AtomicUsize,
        errors: AtomicUsize,
    }

    impl FakeMetrics {
        /// `(success, failed, errors)`
        pub fn counts(&self) -> (usize, usize, usize) {
            (
                self.success.load(Ordering::SeqCst),
                self.failed.load(Ordering::SeqCst),
                self.errors.load(Ordering::SeqCst),
            )
        }
    }

    impl ProxyMetrics for FakeMetrics {
        fn increment_success(&self) {
            self.success.fetch_add(1, Ordering::SeqCst);
        }

        fn increment_failed(&self) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }

        fn increment_errors(&self) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counter_metrics_fold_failures_into_errors() {
        let store = Arc::new(CounterStore::new());
        let metrics = CounterMetrics::new(store.clone());

        metrics.increment_success();
        metrics.increment_failed();
        metrics.increment_errors();
        metrics.increment_errors();

        assert_eq!(store.get(PROXIED_SUCCESS), 1);
        assert_eq!(store.get(PROXIED_ERRORS), 3);
    }
}
