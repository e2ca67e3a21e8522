//! Request execution over the shared HTTP client.
//!
//! Stands in for the load-test engine at its interface boundary: it sends
//! descriptors and reports the response status, nothing more.

use crate::generator::RequestDescriptor;
use loadgen_common::{HttpConfig, TransportError, TrustPolicy, build_http_client};
use reqwest::{Client, StatusCode};
use tracing::instrument;

/// Sends [`RequestDescriptor`]s under a fixed trust policy.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    trust_policy: TrustPolicy,
}

impl RequestExecutor {
    /// Build the HTTP client once from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_http_client(config)?,
            trust_policy: config.trust_policy,
        })
    }

    /// Trust policy the client was built with.
    #[must_use]
    pub const fn trust_policy(&self) -> TrustPolicy {
        self.trust_policy
    }

    /// Execute a request and return the response status.
    ///
    /// # Errors
    ///
    /// Returns a classified [`TransportError`] if the request fails before a
    /// response arrives.
    #[instrument(skip(self), fields(method = %request.method(), uri = %request.uri()))]
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<StatusCode, TransportError> {
        let response = self
            .client
            .request(request.method().clone(), request.uri().clone())
            .send()
            .await
            .map_err(TransportError::classify)?;
        Ok(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_keeps_policy() {
        let config = HttpConfig::default().with_trust_policy(TrustPolicy::AcceptAll);
        let executor = RequestExecutor::new(&config).unwrap();
        assert_eq!(executor.trust_policy(), TrustPolicy::AcceptAll);
    }
}
