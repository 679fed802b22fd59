//! Operation counters subsystem.
//!
//! # Data Flow
//! ```text
//! proxy::forwarder (per request)
//!     → observability::metrics::CounterMetrics
//!     → store.rs (named i64 values)
//!     ← http::handlers::metrics (JSON snapshot)
//! ```
//!
//! # Design Decisions
//! - One store per process, shared via Arc; no global state
//! - Entries are created lazily and live for the process lifetime
//! - Updates are atomic per key; there is no cross-key transaction

pub mod store;

pub use store::CounterStore;

/// Requests whose upstream response was relayed completely.
pub const PROXIED_SUCCESS: &str = "proxied_success";

/// Requests that ended in any failure state.
pub const PROXIED_ERRORS: &str = "proxied_errors";
