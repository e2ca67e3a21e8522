//! Transport trust policy for TLS peer certificates.
//!
//! A [`TrustPolicy`] decides whether a TLS peer is accepted given its leaf
//! certificate, the presented chain and the validation errors found for it.
//! The errors come from webpki chain and hostname verification; see
//! [`crate::verifier::PolicyVerifier`], which runs the policy on every
//! handshake made by a client from [`crate::http::build_http_client`].

use chrono::{DateTime, Utc};
use rustls::CertificateError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use x509_parser::prelude::*;

/// Description of a certificate presented by a TLS peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCertificate {
    /// Subject distinguished name
    pub subject: String,
    /// Issuer distinguished name
    pub issuer: String,
    /// DNS names from the subject alternative name extension
    pub dns_names: Vec<String>,
    /// Start of the validity window
    pub not_before: DateTime<Utc>,
    /// End of the validity window
    pub not_after: DateTime<Utc>,
}

impl PeerCertificate {
    /// Create a certificate description.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        not_before: DateTime<Utc>,
        not_after: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            issuer: issuer.into(),
            dns_names: Vec::new(),
            not_before,
            not_after,
        }
    }

    /// Add a DNS subject alternative name.
    #[must_use]
    pub fn with_dns_name(mut self, name: impl Into<String>) -> Self {
        self.dns_names.push(name.into());
        self
    }

    /// Describe a DER-encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateParseError`] if the bytes are not a certificate
    /// or its validity window is out of range.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateParseError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| CertificateParseError(e.to_string()))?;

        let validity = cert.validity();
        let not_before = timestamp(validity.not_before.timestamp())?;
        let not_after = timestamp(validity.not_after.timestamp())?;

        let mut dns_names = Vec::new();
        for ext in cert.extensions() {
            if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
                for name in &san.general_names {
                    if let GeneralName::DNSName(dns) = name {
                        dns_names.push((*dns).to_string());
                    }
                }
            }
        }

        Ok(Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            dns_names,
            not_before,
            not_after,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, CertificateParseError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CertificateParseError(format!("validity timestamp {secs} out of range")))
}

/// Certificate bytes that could not be described.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to parse certificate: {0}")]
pub struct CertificateParseError(pub String);

/// Validation errors found for a TLS peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PolicyErrors {
    /// The peer presented no usable certificate
    pub certificate_missing: bool,
    /// No certificate name matches the requested host
    pub name_mismatch: bool,
    /// The chain is expired, not yet valid, or not anchored in a trusted root
    pub chain_invalid: bool,
}

impl PolicyErrors {
    /// No errors.
    pub const NONE: Self = Self {
        certificate_missing: false,
        name_mismatch: false,
        chain_invalid: false,
    };

    /// Only a missing certificate.
    pub const CERTIFICATE_MISSING: Self = Self {
        certificate_missing: true,
        ..Self::NONE
    };

    /// Only a name mismatch.
    pub const NAME_MISMATCH: Self = Self {
        name_mismatch: true,
        ..Self::NONE
    };

    /// Only chain errors.
    pub const CHAIN_INVALID: Self = Self {
        chain_invalid: true,
        ..Self::NONE
    };

    /// Check if no error is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !(self.certificate_missing || self.name_mismatch || self.chain_invalid)
    }

    /// Combine two error sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            certificate_missing: self.certificate_missing || other.certificate_missing,
            name_mismatch: self.name_mismatch || other.name_mismatch,
            chain_invalid: self.chain_invalid || other.chain_invalid,
        }
    }

    /// Classify a certificate verification failure.
    ///
    /// Hostname failures map to a name mismatch, unreadable or absent
    /// certificates to a missing certificate, and everything else
    /// (unknown issuer, expiry, bad signatures, revocation) to chain errors.
    #[must_use]
    pub const fn from_tls_error(error: &rustls::Error) -> Self {
        match error {
            rustls::Error::NoCertificatesPresented
            | rustls::Error::InvalidCertificate(CertificateError::BadEncoding) => {
                Self::CERTIFICATE_MISSING
            }
            rustls::Error::InvalidCertificate(
                CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. },
            ) => Self::NAME_MISMATCH,
            _ => Self::CHAIN_INVALID,
        }
    }
}

impl fmt::Display for PolicyErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut names = Vec::with_capacity(3);
        if self.certificate_missing {
            names.push("certificate-missing");
        }
        if self.name_mismatch {
            names.push("name-mismatch");
        }
        if self.chain_invalid {
            names.push("chain-invalid");
        }
        f.write_str(&names.join("|"))
    }
}

/// Certificate acceptance policy for TLS handshakes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TrustPolicy {
    /// Accept a peer only when validation found no errors.
    #[default]
    Strict,
    /// Accept every peer regardless of certificate, chain or policy errors.
    ///
    /// Only for load-test runs against non-production endpoints.
    AcceptAll,
}

impl TrustPolicy {
    /// Decide whether the peer is accepted.
    #[must_use]
    pub const fn accepts(
        self,
        _certificate: Option<&PeerCertificate>,
        _chain: &[PeerCertificate],
        errors: PolicyErrors,
    ) -> bool {
        match self {
            Self::Strict => errors.is_empty(),
            Self::AcceptAll => true,
        }
    }

    /// Whether peers failing verification are let through.
    #[must_use]
    pub const fn accepts_invalid_certificates(self) -> bool {
        matches!(self, Self::AcceptAll)
    }

    /// Canonical configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::AcceptAll => "accept-all",
        }
    }
}

impl fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown trust policy name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown trust policy '{0}': expected 'strict' or 'accept-all'")]
pub struct ParseTrustPolicyError(pub String);

impl FromStr for TrustPolicy {
    type Err = ParseTrustPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "accept-all" | "permissive" | "insecure" => Ok(Self::AcceptAll),
            _ => Err(ParseTrustPolicyError(s.to_string())),
        }
    }
}
