//! HTTP client configuration and building.
//!
//! The trust policy and the minimum TLS version are part of the client
//! configuration, so every request sent through a built client runs under
//! the same policy.

use crate::error::TransportError;
use crate::trust::TrustPolicy;
use crate::verifier::PolicyVerifier;
use reqwest::{Client, ClientBuilder};
use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore, SupportedProtocolVersion};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

static TLS12_AND_UP: &[&SupportedProtocolVersion] =
    &[&rustls::version::TLS13, &rustls::version::TLS12];
static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

/// Lowest TLS version the client will negotiate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    /// TLS 1.2 and 1.3
    #[default]
    Tls12,
    /// TLS 1.3 only
    Tls13,
}

impl TlsVersion {
    /// Protocol versions offered in the client hello.
    #[must_use]
    pub fn protocol_versions(self) -> &'static [&'static SupportedProtocolVersion] {
        match self {
            Self::Tls12 => TLS12_AND_UP,
            Self::Tls13 => TLS13_ONLY,
        }
    }

    /// Configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tls12 => "1.2",
            Self::Tls13 => "1.3",
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown TLS version name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported minimum TLS version '{0}': expected '1.2' or '1.3'")]
pub struct ParseTlsVersionError(pub String);

impl FromStr for TlsVersion {
    type Err = ParseTlsVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_start_matches("tls").trim() {
            "1.2" | "12" => Ok(Self::Tls12),
            "1.3" | "13" => Ok(Self::Tls13),
            _ => Err(ParseTlsVersionError(s.to_string())),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Pool idle timeout (default: 90s)
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (default: 10)
    pub pool_max_idle_per_host: usize,
    /// User agent string
    pub user_agent: String,
    /// Certificate acceptance policy (default: strict)
    pub trust_policy: TrustPolicy,
    /// Minimum negotiated TLS version (default: TLS 1.2)
    pub min_tls_version: TlsVersion,
    /// Roots trusted in addition to the bundled web PKI roots
    pub extra_roots: Vec<CertificateDer<'static>>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: concat!("invoice-loadgen/", env!("CARGO_PKG_VERSION")).to_string(),
            trust_policy: TrustPolicy::Strict,
            min_tls_version: TlsVersion::Tls12,
            extra_roots: Vec::new(),
        }
    }
}

impl HttpConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the pool settings.
    #[must_use]
    pub const fn with_pool_config(mut self, idle_timeout: Duration, max_idle: usize) -> Self {
        self.pool_idle_timeout = idle_timeout;
        self.pool_max_idle_per_host = max_idle;
        self
    }

    /// Set the trust policy.
    #[must_use]
    pub const fn with_trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.trust_policy = policy;
        self
    }

    /// Set the minimum TLS version.
    #[must_use]
    pub const fn with_min_tls_version(mut self, version: TlsVersion) -> Self {
        self.min_tls_version = version;
        self
    }

    /// Trust the certificates in a PEM bundle as additional roots.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the bundle cannot be read
    /// or holds no certificate.
    pub fn with_root_certificates_pem(mut self, pem: &[u8]) -> Result<Self, TransportError> {
        let certs = rustls_pemfile::certs(&mut &*pem)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TransportError::ClientBuild(format!("Failed to parse PEM: {e}")))?;
        if certs.is_empty() {
            return Err(TransportError::ClientBuild(
                "No PEM certificate found".to_string(),
            ));
        }
        self.extra_roots.extend(certs);
        Ok(self)
    }
}

/// Build the rustls configuration for `config`.
///
/// Certificates are verified by a [`PolicyVerifier`] anchored in the web
/// PKI roots plus [`HttpConfig::extra_roots`]. Only the protocol versions at
/// or above [`HttpConfig::min_tls_version`] are offered.
///
/// # Errors
///
/// Returns [`TransportError::ClientBuild`] if a root is malformed or the
/// protocol versions are unusable.
pub fn build_tls_config(config: &HttpConfig) -> Result<ClientConfig, TransportError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    for der in &config.extra_roots {
        roots
            .add(der.clone())
            .map_err(|e| TransportError::ClientBuild(format!("Invalid root certificate: {e}")))?;
    }
    debug!(
        roots = roots.len(),
        extra = config.extra_roots.len(),
        min_tls = %config.min_tls_version,
        "TLS roots loaded"
    );

    let verifier = PolicyVerifier::new(config.trust_policy, roots, Arc::clone(&provider))?;

    let mut tls = ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(config.min_tls_version.protocol_versions())
        .map_err(|e| TransportError::ClientBuild(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    tls.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(tls)
}

/// Build a configured HTTP client.
///
/// Every handshake made by the client goes through the configured
/// [`TrustPolicy`]; see [`build_tls_config`].
///
/// # Errors
///
/// Returns [`TransportError::ClientBuild`] if the client cannot be built.
///
/// # Examples
///
/// ```
/// use loadgen_common::{HttpConfig, TrustPolicy, build_http_client};
///
/// let config = HttpConfig::default().with_trust_policy(TrustPolicy::AcceptAll);
/// let client = build_http_client(&config).expect("Failed to build client");
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, TransportError> {
    if config.trust_policy.accepts_invalid_certificates() {
        warn!(
            policy = %config.trust_policy,
            "TLS certificate errors will be ignored; use only against test endpoints"
        );
    }

    let tls = build_tls_config(config)?;

    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .use_preconfigured_tls(tls)
        .build()
        .map_err(|e| TransportError::ClientBuild(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool_max_idle_per_host, 10);
        assert_eq!(config.trust_policy, TrustPolicy::Strict);
        assert_eq!(config.min_tls_version, TlsVersion::Tls12);
        assert!(config.extra_roots.is_empty());
        assert!(config.user_agent.starts_with("invoice-loadgen/"));
    }

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent")
            .with_trust_policy(TrustPolicy::AcceptAll)
            .with_min_tls_version(TlsVersion::Tls13);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.trust_policy, TrustPolicy::AcceptAll);
        assert_eq!(config.min_tls_version, TlsVersion::Tls13);
    }

    #[test]
    fn test_protocol_versions_respect_floor() {
        let tls12 = TlsVersion::Tls12.protocol_versions();
        assert_eq!(tls12.len(), 2);
        assert!(tls12.iter().any(|v| v.version == rustls::ProtocolVersion::TLSv1_2));

        let tls13 = TlsVersion::Tls13.protocol_versions();
        assert_eq!(tls13.len(), 1);
        assert_eq!(tls13[0].version, rustls::ProtocolVersion::TLSv1_3);
    }

    #[test]
    fn test_parse_tls_version() {
        assert_eq!("1.2".parse(), Ok(TlsVersion::Tls12));
        assert_eq!("TLS1.3".parse(), Ok(TlsVersion::Tls13));
        assert!("1.1".parse::<TlsVersion>().is_err());
        assert!(TlsVersion::Tls12 < TlsVersion::Tls13);
    }

    #[test]
    fn test_root_bundle_without_certificates_rejected() {
        let result = HttpConfig::default().with_root_certificates_pem(b"no pem here");
        assert!(matches!(result, Err(TransportError::ClientBuild(_))));
    }

    #[test]
    fn test_tls_config_offers_only_http1() {
        let tls = build_tls_config(&HttpConfig::default()).unwrap();
        assert_eq!(tls.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn test_build_client_for_each_policy() {
        for policy in [TrustPolicy::Strict, TrustPolicy::AcceptAll] {
            let config = HttpConfig::default().with_trust_policy(policy);
            assert!(build_http_client(&config).is_ok());
        }
    }
}
