//! Property-based tests for loadgen-common.
//!
//! These tests verify trust policy and transport error properties across
//! generated inputs using proptest.

use loadgen_common::{PolicyErrors, TransportError, TrustPolicy};
use proptest::prelude::*;
use rustls::CertificateError;
use test_utils::{certificate_chain_strategy, peer_certificate_strategy, policy_errors_strategy};

fn verification_failure(index: usize) -> rustls::Error {
    let reason = match index {
        0 => CertificateError::UnknownIssuer,
        1 => CertificateError::Expired,
        2 => CertificateError::NotValidYet,
        3 => CertificateError::BadSignature,
        4 => CertificateError::Revoked,
        5 => CertificateError::NotValidForName,
        6 => CertificateError::InvalidPurpose,
        7 => CertificateError::BadEncoding,
        _ => return rustls::Error::NoCertificatesPresented,
    };
    rustls::Error::InvalidCertificate(reason)
}

// Property 1: Strict acceptance
// *For any* combination of policy errors, the strict policy SHALL accept the
// peer if and only if no error is set.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_strict_accepts_only_clean_peers(
        errors in policy_errors_strategy(),
        certificate in proptest::option::of(peer_certificate_strategy()),
    ) {
        prop_assert_eq!(
            TrustPolicy::Strict.accepts(certificate.as_ref(), &[], errors),
            errors.is_empty()
        );
    }

    #[test]
    fn prop_accept_all_accepts_everything(
        errors in policy_errors_strategy(),
        certificate in proptest::option::of(peer_certificate_strategy()),
        chain in certificate_chain_strategy(),
    ) {
        prop_assert!(TrustPolicy::AcceptAll.accepts(certificate.as_ref(), &chain, errors));
    }
}

// Property 2: Verification failures are never clean
// *For any* certificate verification failure, the classified error set SHALL
// be non-empty, so the strict policy rejects it.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_verification_failures_are_never_clean(index in 0usize..9) {
        let errors = PolicyErrors::from_tls_error(&verification_failure(index));
        prop_assert!(!errors.is_empty());
        prop_assert!(!TrustPolicy::Strict.accepts(None, &[], errors));
    }

    #[test]
    fn prop_union_is_commutative(a in policy_errors_strategy(), b in policy_errors_strategy()) {
        prop_assert_eq!(a.union(b), b.union(a));
        prop_assert_eq!(a.union(b).is_empty(), a.is_empty() && b.is_empty());
    }
}

// Property 3: Retryability classification
// *For any* message, timeouts and unavailability SHALL be retryable and
// client build failures SHALL NOT.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_retryable_errors_are_consistent(msg in "[a-zA-Z0-9 ]{1,50}") {
        prop_assert!(TransportError::timeout(&msg).is_retryable());
        prop_assert!(TransportError::unavailable(&msg).is_retryable());
        prop_assert!(!TransportError::ClientBuild(msg).is_retryable());
    }
}
