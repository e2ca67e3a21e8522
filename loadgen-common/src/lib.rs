//! Shared transport concerns for the load generators.
//!
//! This crate provides:
//! - Transport error types with retryability classification
//! - The TLS trust policy and the rustls verifier that applies it
//! - HTTP client configuration and building
//! - Tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod tracing_config;
pub mod trust;
pub mod verifier;

pub use error::TransportError;
pub use http::{HttpConfig, ParseTlsVersionError, TlsVersion, build_http_client, build_tls_config};
pub use tracing_config::{LogFormat, TracingConfig, init_tracing, service_span};
pub use trust::{
    CertificateParseError, ParseTrustPolicyError, PeerCertificate, PolicyErrors, TrustPolicy,
};
pub use verifier::PolicyVerifier;
