//! Response helpers shared by the proxy and service handlers.
//!
//! # Responsibilities
//! - Render failures as a JSON error object
//! - Copy upstream headers onto the relayed response
//! - Strip connection-scoped (hop-by-hop) headers
//!
//! # Design Decisions
//! - Multi-valued upstream headers are folded into one value joined by `;`
//! - `Access-Control-Allow-Origin: *` is set after the upstream headers so an
//!   upstream value can never replace it

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Connection-scoped headers that are never forwarded in either direction.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub error: bool,
    pub message: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            error: true,
            message: message.into(),
        }
    }
}

/// Build a JSON error response with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(status, message))).into_response()
}

/// Whether a header only applies to a single transport hop.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Copy upstream headers for the caller, joining repeated values with `;`.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.keys_len() + 1);

    for name in upstream.keys() {
        if is_hop_by_hop(name) {
            continue;
        }

        let mut values = upstream.get_all(name).iter();
        let Some(first) = values.next() else {
            continue;
        };

        let mut joined = first.as_bytes().to_vec();
        for value in values {
            joined.push(b';');
            joined.extend_from_slice(value.as_bytes());
        }

        match HeaderValue::from_bytes(&joined) {
            Ok(value) => {
                headers.insert(name.clone(), value);
            }
            Err(_) => {
                tracing::debug!(header = %name, "Dropping unrepresentable upstream header");
            }
        }
    }

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );

    headers
}
