//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! http::server (captured route + inbound request)
//!     → forwarder.rs (state machine, counter discipline)
//!     → target.rs (captured route → target URI)
//!     → client.rs (bounded outbound call)
//!     → relay.rs (stream upstream body back, settle counters)
//!     → caller
//! ```
//!
//! # Design Decisions
//! - At most one upstream attempt per inbound request; nothing is retried
//! - Failures map to a JSON body and a fixed status (error.rs)
//! - The client and the metrics sink are injected capabilities

pub mod client;
pub mod error;
pub mod forwarder;
pub mod relay;
pub mod target;

pub use client::{ClientConfig, ForwardOutcome, ForwardingClient, OutboundRequest, UpstreamClient, UpstreamResponse};
pub use error::ProxyError;
pub use forwarder::RequestForwarder;
pub use target::{build_target_uri, ResolvedTarget, Schema};
