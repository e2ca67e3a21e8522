//! Handshake tests for the trust policy.
//!
//! Certificates are checked twice: directly through [`PolicyVerifier`], and
//! end to end through clients from `build_http_client` talking to a local
//! HTTPS endpoint.

use loadgen_common::{
    HttpConfig, PolicyErrors, PolicyVerifier, TlsVersion, TrustPolicy, build_http_client,
};
use rustls::client::danger::ServerCertVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{RootCertStore, crypto::CryptoProvider};
use std::sync::Arc;
use test_utils::tls::{TEST_CA_PEM, TEST_HOST, TlsIdentity, TlsTestServer, certificates};

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

fn web_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    roots
}

fn roots_with_test_ca() -> RootCertStore {
    let mut roots = web_roots();
    for der in certificates(TEST_CA_PEM).unwrap() {
        roots.add(der).unwrap();
    }
    roots
}

fn leaf(identity: TlsIdentity) -> CertificateDer<'static> {
    identity.certificates().unwrap().remove(0)
}

fn host() -> ServerName<'static> {
    ServerName::try_from(TEST_HOST).unwrap()
}

fn verify(
    verifier: &PolicyVerifier,
    end_entity: &CertificateDer<'_>,
    intermediates: &[CertificateDer<'_>],
) -> bool {
    verifier
        .verify_server_cert(end_entity, intermediates, &host(), &[], UnixTime::now())
        .is_ok()
}

#[test]
fn test_strict_accepts_leaf_chained_to_trusted_root() {
    let verifier = PolicyVerifier::new(TrustPolicy::Strict, roots_with_test_ca(), provider()).unwrap();
    let end_entity = leaf(TlsIdentity::LOCALHOST);

    assert_eq!(
        verifier.policy_errors(&end_entity, &[], &host(), UnixTime::now()),
        PolicyErrors::NONE
    );
    assert!(verify(&verifier, &end_entity, &[]));
}

#[test]
fn test_strict_rejects_self_signed_leaf() {
    let verifier = PolicyVerifier::new(TrustPolicy::Strict, roots_with_test_ca(), provider()).unwrap();
    let end_entity = leaf(TlsIdentity::SELF_SIGNED);

    assert_eq!(
        verifier.policy_errors(&end_entity, &[], &host(), UnixTime::now()),
        PolicyErrors::CHAIN_INVALID
    );
    assert!(!verify(&verifier, &end_entity, &[]));
}

#[test]
fn test_strict_rejects_chain_to_untrusted_root() {
    // The test root is presented by the peer but is not in the store.
    let verifier = PolicyVerifier::new(TrustPolicy::Strict, web_roots(), provider()).unwrap();
    let end_entity = leaf(TlsIdentity::LOCALHOST);
    let presented_root = certificates(TEST_CA_PEM).unwrap();

    assert!(
        verifier
            .policy_errors(&end_entity, &presented_root, &host(), UnixTime::now())
            .chain_invalid
    );
    assert!(!verify(&verifier, &end_entity, &presented_root));
}

#[test]
fn test_strict_reports_name_mismatch() {
    let verifier = PolicyVerifier::new(TrustPolicy::Strict, roots_with_test_ca(), provider()).unwrap();
    let end_entity = leaf(TlsIdentity::MISMATCHED);

    assert_eq!(
        verifier.policy_errors(&end_entity, &[], &host(), UnixTime::now()),
        PolicyErrors::NAME_MISMATCH
    );
    assert!(!verify(&verifier, &end_entity, &[]));
}

#[test]
fn test_strict_reports_expired_leaf() {
    let verifier = PolicyVerifier::new(TrustPolicy::Strict, roots_with_test_ca(), provider()).unwrap();
    let end_entity = leaf(TlsIdentity::EXPIRED);

    assert_eq!(
        verifier.policy_errors(&end_entity, &[], &host(), UnixTime::now()),
        PolicyErrors::CHAIN_INVALID
    );
    assert!(!verify(&verifier, &end_entity, &[]));
}

#[test]
fn test_accept_all_accepts_every_fixture() {
    let verifier = PolicyVerifier::new(TrustPolicy::AcceptAll, web_roots(), provider()).unwrap();
    for identity in [
        TlsIdentity::LOCALHOST,
        TlsIdentity::MISMATCHED,
        TlsIdentity::EXPIRED,
        TlsIdentity::SELF_SIGNED,
    ] {
        assert!(verify(&verifier, &leaf(identity), &[]));
    }
}

fn strict_with_test_root() -> HttpConfig {
    HttpConfig::default()
        .with_root_certificates_pem(TEST_CA_PEM.as_bytes())
        .unwrap()
}

async fn get(config: &HttpConfig, url: &str) -> Result<reqwest::StatusCode, reqwest::Error> {
    let client = build_http_client(config).unwrap();
    client.get(url).send().await.map(|response| response.status())
}

#[tokio::test]
async fn test_strict_client_fails_handshake_with_self_signed_server() {
    let server = TlsTestServer::start(TlsIdentity::SELF_SIGNED).await.unwrap();

    let result = get(&strict_with_test_root(), &server.base_url()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_accept_all_client_completes_handshake_with_self_signed_server() {
    let server = TlsTestServer::start(TlsIdentity::SELF_SIGNED).await.unwrap();
    let config = HttpConfig::default().with_trust_policy(TrustPolicy::AcceptAll);

    let status = get(&config, &server.base_url()).await.unwrap();
    assert_eq!(status, reqwest::StatusCode::OK);
}

#[tokio::test]
async fn test_strict_client_trusts_configured_root() {
    let server = TlsTestServer::start(TlsIdentity::LOCALHOST).await.unwrap();

    let status = get(&strict_with_test_root(), &server.base_url()).await.unwrap();
    assert_eq!(status, reqwest::StatusCode::OK);

    // Without the extra root the same server is untrusted.
    assert!(get(&HttpConfig::default(), &server.base_url()).await.is_err());
}

#[tokio::test]
async fn test_strict_client_rejects_wrong_host_certificate() {
    let server = TlsTestServer::start(TlsIdentity::MISMATCHED).await.unwrap();

    assert!(get(&strict_with_test_root(), &server.base_url()).await.is_err());

    let accept_all = strict_with_test_root().with_trust_policy(TrustPolicy::AcceptAll);
    assert_eq!(
        get(&accept_all, &server.base_url()).await.unwrap(),
        reqwest::StatusCode::OK
    );
}

#[tokio::test]
async fn test_tls13_floor_refuses_tls12_only_server() {
    let server =
        TlsTestServer::start_with_versions(TlsIdentity::LOCALHOST, &[&rustls::version::TLS12])
            .await
            .unwrap();

    let tls12_floor = strict_with_test_root();
    assert_eq!(
        get(&tls12_floor, &server.base_url()).await.unwrap(),
        reqwest::StatusCode::OK
    );

    let tls13_floor = strict_with_test_root().with_min_tls_version(TlsVersion::Tls13);
    assert!(get(&tls13_floor, &server.base_url()).await.is_err());
}

#[tokio::test]
async fn test_tls13_floor_reaches_tls13_server() {
    let server =
        TlsTestServer::start_with_versions(TlsIdentity::LOCALHOST, &[&rustls::version::TLS13])
            .await
            .unwrap();

    let config = strict_with_test_root().with_min_tls_version(TlsVersion::Tls13);
    assert_eq!(
        get(&config, &server.base_url()).await.unwrap(),
        reqwest::StatusCode::OK
    );
}
