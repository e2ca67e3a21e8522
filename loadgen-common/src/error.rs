//! Transport error types shared by the load generators.
//!
//! Errors carry a retryability classification so the runner can tell
//! transient transport failures from defects.

use thiserror::Error;

/// Error raised while building the HTTP client or executing a request.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request or connect timeout elapsed
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Target endpoint could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl TransportError {
    /// Check if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use loadgen_common::TransportError;
    ///
    /// let err = TransportError::unavailable("connection refused");
    /// assert!(err.is_retryable());
    ///
    /// let err = TransportError::ClientBuild("no TLS backend".to_string());
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Unavailable(_))
    }

    /// Classify a request failure from reqwest.
    #[must_use]
    pub fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Unavailable(err.to_string())
        } else {
            Self::Http(err)
        }
    }

    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a timeout error with the given message.
    #[must_use]
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}
