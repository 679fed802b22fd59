//! HTTP forward proxy daemon library.
//!
//! A request to `/<prefix>/[http|https/]<host>/<path>?<query>` is forwarded
//! to `<schema>://<host>/<path>?<query>` and the upstream response is
//! streamed back with permissive CORS.

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;

// Shared state
pub mod counters;

// Cross-cutting concerns
pub mod cli;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use counters::CounterStore;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::RequestForwarder;
