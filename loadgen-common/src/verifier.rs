//! Server certificate verification under a [`TrustPolicy`].

use crate::error::TransportError;
use crate::trust::{PeerCertificate, PolicyErrors, TrustPolicy};
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use tracing::debug;

/// Verifies server certificates with webpki, then lets the trust policy
/// decide on the outcome.
///
/// Chain building, expiry and hostname checks are always run against the
/// configured roots. Their failures are folded into [`PolicyErrors`] and
/// handed to [`TrustPolicy::accepts`]; handshake signatures are always
/// checked, whatever the policy.
#[derive(Debug)]
pub struct PolicyVerifier {
    policy: TrustPolicy,
    inner: Arc<WebPkiServerVerifier>,
}

impl PolicyVerifier {
    /// Create a verifier anchored in `roots`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if `roots` is empty.
    pub fn new(
        policy: TrustPolicy,
        roots: RootCertStore,
        provider: Arc<CryptoProvider>,
    ) -> Result<Self, TransportError> {
        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(|e| TransportError::ClientBuild(format!("certificate verifier: {e}")))?;
        Ok(Self { policy, inner })
    }

    /// The policy applied to verification results.
    #[must_use]
    pub const fn policy(&self) -> TrustPolicy {
        self.policy
    }

    /// Run webpki verification and report what it found.
    #[must_use]
    pub fn policy_errors(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        now: UnixTime,
    ) -> PolicyErrors {
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, &[], now)
            .map_or_else(|e| PolicyErrors::from_tls_error(&e), |_| PolicyErrors::NONE)
    }
}

impl ServerCertVerifier for PolicyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let verdict =
            self.inner
                .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now);

        let mut errors = verdict
            .as_ref()
            .map_or_else(|e| PolicyErrors::from_tls_error(e), |_| PolicyErrors::NONE);

        let certificate = PeerCertificate::from_der(end_entity).ok();
        if certificate.is_none() {
            errors = errors.union(PolicyErrors::CERTIFICATE_MISSING);
        }
        let chain: Vec<PeerCertificate> = intermediates
            .iter()
            .filter_map(|der| PeerCertificate::from_der(der).ok())
            .collect();

        if !self.policy.accepts(certificate.as_ref(), &chain, errors) {
            debug!(
                server = ?server_name,
                %errors,
                policy = %self.policy,
                "TLS peer rejected"
            );
            return Err(verdict.err().unwrap_or_else(|| {
                rustls::Error::InvalidCertificate(
                    rustls::CertificateError::ApplicationVerificationFailure,
                )
            }));
        }

        if !errors.is_empty() {
            debug!(
                server = ?server_name,
                %errors,
                policy = %self.policy,
                "TLS peer accepted despite verification errors"
            );
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Arc<CryptoProvider> {
        Arc::new(rustls::crypto::ring::default_provider())
    }

    #[test]
    fn test_empty_roots_rejected() {
        let result = PolicyVerifier::new(TrustPolicy::Strict, RootCertStore::empty(), provider());
        assert!(matches!(result, Err(TransportError::ClientBuild(_))));
    }

    #[test]
    fn test_keeps_policy() {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let verifier = PolicyVerifier::new(TrustPolicy::AcceptAll, roots, provider()).unwrap();
        assert_eq!(verifier.policy(), TrustPolicy::AcceptAll);
        assert!(!verifier.supported_verify_schemes().is_empty());
    }

    #[test]
    fn test_garbage_leaf_is_missing_certificate() {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let verifier = PolicyVerifier::new(TrustPolicy::Strict, roots, provider()).unwrap();
        let leaf = CertificateDer::from(b"garbage".to_vec());
        let name = ServerName::try_from("svc.example.com").unwrap();

        let errors = verifier.policy_errors(&leaf, &[], &name, UnixTime::now());
        assert!(errors.certificate_missing);
        assert!(verifier.verify_server_cert(&leaf, &[], &name, &[], UnixTime::now()).is_err());
    }
}
