//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (proxy outcome counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → GET /metrics (JSON snapshot of the counter store)
//!     → optional Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Metric updates are atomic increments
//! - Prometheus export is opt-in

pub mod logging;
pub mod metrics;
