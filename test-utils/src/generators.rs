//! Shared proptest generators.

use chrono::{DateTime, Duration, Utc};
use loadgen_common::{PeerCertificate, PolicyErrors, TrustPolicy};
use proptest::prelude::*;

/// Generate absolute http(s) base URLs, with and without port and path.
pub fn base_url_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("http"), Just("https")],
        "[a-z][a-z0-9]{0,15}(\\.[a-z][a-z0-9]{0,15}){0,3}",
        proptest::option::of(1u16..=65535),
        "(/[a-z0-9_-]{1,10}){0,3}/?",
    )
        .prop_map(|(scheme, host, port, path)| match port {
            Some(port) => format!("{scheme}://{host}:{port}{path}"),
            None => format!("{scheme}://{host}{path}"),
        })
}

/// Generate strings that are not absolute URIs.
pub fn relative_reference_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,10} [a-z]{1,10}( [a-z]{1,10})?",
        "[a-z][a-z0-9-]{0,15}\\.[a-z]{2,5}(/[a-z]{1,10}){0,2}",
        "(/[a-z0-9]{1,10}){1,3}",
        "\\?[a-z]{1,5}=[a-z0-9]{1,5}",
    ]
}

/// Generate absolute URIs that cannot serve as a base for a path.
pub fn opaque_uri_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,10}@[a-z]{1,10}\\.com".prop_map(|addr| format!("mailto:{addr}")),
        "[a-z]{1,10}".prop_map(|text| format!("data:text/plain,{text}")),
        "[a-z]{3,10}".prop_map(|nid| format!("urn:{nid}:1234")),
    ]
}

/// Generate reference years around the present.
pub fn reference_year_strategy() -> impl Strategy<Value = i32> {
    1970i32..2500
}

/// Generate certificate validity windows, some expired, some not yet valid.
pub fn validity_window_strategy() -> impl Strategy<Value = (DateTime<Utc>, DateTime<Utc>)> {
    (-3650i64..3650, 1i64..3650).prop_map(|(start_offset, length)| {
        let not_before = Utc::now() + Duration::days(start_offset);
        (not_before, not_before + Duration::days(length))
    })
}

/// Generate DNS names.
pub fn dns_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9-]{0,15}\\.example\\.(com|net|org)",
        "[a-z]{2,10}".prop_map(|d| format!("*.{d}.internal")),
        Just("localhost".to_string()),
    ]
}

/// Generate peer certificates, valid or not.
pub fn peer_certificate_strategy() -> impl Strategy<Value = PeerCertificate> {
    (
        "CN=[a-z]{3,12}",
        "CN=[a-z]{3,12}",
        validity_window_strategy(),
        proptest::collection::vec(dns_name_strategy(), 0..4),
    )
        .prop_map(|(subject, issuer, (not_before, not_after), dns_names)| {
            PeerCertificate {
                subject,
                issuer,
                dns_names,
                not_before,
                not_after,
            }
        })
}

/// Generate certificate chains of up to three certificates.
pub fn certificate_chain_strategy() -> impl Strategy<Value = Vec<PeerCertificate>> {
    proptest::collection::vec(peer_certificate_strategy(), 0..3)
}

/// Generate every combination of policy errors.
pub fn policy_errors_strategy() -> impl Strategy<Value = PolicyErrors> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(certificate_missing, name_mismatch, chain_invalid)| PolicyErrors {
            certificate_missing,
            name_mismatch,
            chain_invalid,
        },
    )
}

/// Generate trust policies.
pub fn trust_policy_strategy() -> impl Strategy<Value = TrustPolicy> {
    prop_oneof![Just(TrustPolicy::Strict), Just(TrustPolicy::AcceptAll)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn test_base_url_format() {
        let mut runner = TestRunner::default();
        for _ in 0..20 {
            let value = base_url_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(value.starts_with("http://") || value.starts_with("https://"));
        }
    }

    #[test]
    fn test_validity_window_ordered() {
        let mut runner = TestRunner::default();
        for _ in 0..20 {
            let (not_before, not_after) = validity_window_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(not_before < not_after);
        }
    }
}
