//! Upstream API error types.

use std::sync::Arc;

/// Errors from the anime API adapter.
///
/// `Clone` so a single failed request can be shared by every caller that was
/// waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Base URL could not be canonicalized.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Transport failure; no response was received.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Non-2xx response, including 429 throttling.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Response body did not match the expected envelope.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// The upstream asked us to slow down (HTTP 429).
    pub fn is_throttled(&self) -> bool {
        matches!(self, ApiError::HttpError { status: 429 })
    }

    /// No response reached us at all.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ApiError::Timeout } else { ApiError::Network(Arc::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::HttpError { status: 503 };
        assert_eq!(err.to_string(), "HTTP error: 503");

        let err = ApiError::Parse("missing field `data`".to_string());
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_throttled_flag() {
        assert!(ApiError::HttpError { status: 429 }.is_throttled());
        assert!(!ApiError::HttpError { status: 500 }.is_throttled());
        assert!(!ApiError::Timeout.is_throttled());
    }

    #[test]
    fn test_network_flag() {
        assert!(ApiError::Timeout.is_network());
        assert!(!ApiError::HttpError { status: 404 }.is_network());
    }
}
