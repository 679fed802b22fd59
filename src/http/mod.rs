//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route capture)
//!     → request.rs (request ID)
//!     → handlers.rs (index, probes, metrics) or proxy::RequestForwarder
//!     → response.rs (JSON errors, relayed headers)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ProxyRoute};
