//! Error taxonomy for remote calls

use thiserror::Error;

/// Errors surfaced by the task API and AI service clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status from the server
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The server answered 2xx but the envelope carried `success: false`
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The response body did not match any expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client-side configuration problem
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether retrying the request may succeed
    ///
    /// Mirrors the transport retry policy: timeouts, connect failures, and
    /// the usual transient statuses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn test_rejected_is_not_retryable() {
        let err = ApiError::Rejected("title required".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            status: 404,
            message: "task not found".to_string(),
        };
        assert_eq!(err.to_string(), "server returned 404: task not found");
    }
}
