//! Error types for request generation and load-test runs.
//!
//! Generation errors are never retryable: they signal missing or malformed
//! configuration, or a URI that cannot be composed from it. The runner
//! decides whether to skip the iteration or abort the run.

use loadgen_common::TransportError;
use thiserror::Error;

/// Error raised while generating a request descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// Required base URL is absent or empty
    #[error("{param} load test context param value can not be null or empty")]
    MissingBaseUrl {
        /// Name of the context parameter
        param: String,
    },

    /// Base URL is not an absolute URI
    #[error("{url} is not a valid absolute URI: {reason}")]
    InvalidBaseUrl {
        /// Offending value
        url: String,
        /// Parser message
        reason: String,
    },

    /// Joining the request template onto the base URL failed
    #[error("{url} is not a valid request URI: {reason}")]
    InvalidRequestUri {
        /// Base URL joined with the template path
        url: String,
        /// Parser message
        reason: String,
    },

    /// Sampling bounds are degenerate
    #[error("Invalid sampling bounds: {0}")]
    InvalidBounds(String),
}

/// Result type for generation.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

impl GeneratorError {
    /// Check if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingBaseUrl { .. } | Self::InvalidBaseUrl { .. } | Self::InvalidBounds(_)
        )
    }

    /// Check if this is a request URI construction error.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(self, Self::InvalidRequestUri { .. })
    }

    /// Generation errors are defects, not transient failures.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }

    /// Create a missing base URL error.
    #[must_use]
    pub fn missing_base_url(param: impl Into<String>) -> Self {
        Self::MissingBaseUrl {
            param: param.into(),
        }
    }

    /// Create an invalid bounds error.
    #[must_use]
    pub fn invalid_bounds(msg: impl Into<String>) -> Self {
        Self::InvalidBounds(msg.into())
    }
}

/// Error that ends a load-test run.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Request generation failed
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    /// Transport could not be set up
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A virtual user task panicked or was cancelled
    #[error("Virtual user task failed: {0}")]
    Task(String),
}
