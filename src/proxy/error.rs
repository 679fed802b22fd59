//! Failure taxonomy of the forwarding pipeline.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::response::json_error;

const ERROR_PREFIX: &str = "proxy: ";

/// Every way a forwarded request can fail.
///
/// None of these are retried; each maps to exactly one HTTP status.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The router handed over a request without a captured route.
    #[error("cannot extract requested URI")]
    MissingRoute,

    #[error("empty request path")]
    EmptyPath,

    #[error("cannot build target URI")]
    InvalidTarget,

    /// The outbound request could not be assembled.
    #[error("{0}")]
    BuildRequest(String),

    #[error("request timeout exceeded")]
    Timeout,

    #[error("{0}")]
    Unreachable(String),

    #[error("{0}")]
    TooManyRedirects(String),

    #[error("{0}")]
    Internal(String),

    /// Copying the upstream body to the caller failed.
    #[error("{0}")]
    Relay(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingRoute => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::EmptyPath | ProxyError::InvalidTarget => StatusCode::BAD_REQUEST,
            ProxyError::BuildRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ProxyError::Unreachable(_) | ProxyError::TooManyRedirects(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ProxyError::Internal(_) | ProxyError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Failures caused by the upstream rather than by the proxy or the caller.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            ProxyError::Timeout | ProxyError::Unreachable(_) | ProxyError::TooManyRedirects(_)
        )
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        json_error(self.status_code(), format!("{ERROR_PREFIX}{self}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (ProxyError::MissingRoute, 500),
            (ProxyError::EmptyPath, 400),
            (ProxyError::InvalidTarget, 400),
            (ProxyError::BuildRequest("x".into()), 500),
            (ProxyError::Timeout, 408),
            (ProxyError::Unreachable("x".into()), 503),
            (ProxyError::TooManyRedirects("x".into()), 503),
            (ProxyError::Internal("x".into()), 500),
            (ProxyError::Relay("x".into()), 500),
        ];

        for (err, code) in cases {
            assert_eq!(err.status_code().as_u16(), code, "{err:?}");
        }
    }

    #[test]
    fn upstream_failures() {
        assert!(ProxyError::Timeout.is_upstream_failure());
        assert!(ProxyError::TooManyRedirects("x".into()).is_upstream_failure());
        assert!(!ProxyError::EmptyPath.is_upstream_failure());
        assert!(!ProxyError::Relay("x".into()).is_upstream_failure());
    }

    #[tokio::test]
    async fn renders_json_body() {
        let response = ProxyError::EmptyPath.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], 400);
        assert_eq!(json["error"], true);
        assert_eq!(json["message"], "proxy: empty request path");
    }
}
