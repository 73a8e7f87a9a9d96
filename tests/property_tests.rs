/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;

use chrono::Utc;
use halo_proxycurl_sync::derived_fields::build_derived_patch;
use halo_proxycurl_sync::enrichment::{build_patch, is_valid_domain, parse_email_domains};
use halo_proxycurl_sync::models::{fields, StoredPayload};

// Property: domain parsing should never panic and never emit blanks
proptest! {
    #[test]
    fn domain_parsing_never_panics(raw in "\\PC*") {
        let _ = parse_email_domains(&raw);
    }

    #[test]
    fn parsed_domains_are_trimmed_and_non_empty(raw in "\\PC*") {
        for domain in parse_email_domains(&raw) {
            prop_assert!(!domain.is_empty());
            prop_assert_eq!(domain.trim(), domain.as_str());
        }
    }

    #[test]
    fn parsing_preserves_domain_order(
        domains in proptest::collection::vec("[a-z]{2,10}\\.[a-z]{2,4}", 1..6)
    ) {
        let joined = domains.join(",");
        prop_assert_eq!(parse_email_domains(&joined), domains);
    }

    #[test]
    fn domain_validation_never_panics(domain in "\\PC*") {
        let _ = is_valid_domain(&domain);
    }

    #[test]
    fn well_formed_domains_validate(
        label in "[a-z][a-z0-9]{1,10}",
        tld in "[a-z]{2,6}"
    ) {
        let domain = format!("{}.{}", label, tld);
        if domain.len() >= 4 {
            prop_assert!(is_valid_domain(&domain));
        }
    }
}

// Property: every patch carries the payload and the sync stamp; bound
// fields appear only when the profile has the bound
proptest! {
    #[test]
    fn patch_always_has_payload_and_stamp(
        lower in proptest::option::of(1u64..100_000),
        upper in proptest::option::of(1u64..100_000),
    ) {
        let payload: StoredPayload = serde_json::from_value(serde_json::json!({
            "schema_version": 1,
            "url": "https://www.linkedin.com/company/acme",
            "profile": { "company_size": [lower, upper] }
        })).unwrap();

        let patch = build_patch(&payload, Utc::now()).unwrap();

        prop_assert!(patch.iter().any(|f| f.name == fields::PAYLOAD));
        prop_assert!(patch.iter().any(|f| f.name == fields::LAST_SYNCED));
        prop_assert_eq!(
            patch.iter().any(|f| f.name == fields::SIZE_LOWER),
            lower.is_some()
        );
        prop_assert_eq!(
            patch.iter().any(|f| f.name == fields::SIZE_UPPER),
            upper.is_some()
        );
        prop_assert!(patch.len() >= 2 && patch.len() <= 4);
    }

    #[test]
    fn failure_payload_patch_is_minimal(reason in "[ -~]{1,60}") {
        let payload = StoredPayload::unresolved(reason);
        let patch = build_patch(&payload, Utc::now()).unwrap();

        prop_assert_eq!(patch.len(), 2);
        prop_assert!(!patch.iter().any(|f| f.name == fields::SIZE_LOWER));
        prop_assert!(!patch.iter().any(|f| f.name == fields::SIZE_UPPER));
    }
}

// Property: the stored payload preserves arbitrary provider fields
// through a write/parse round trip
proptest! {
    #[test]
    fn stored_payload_round_trip_preserves_extras(
        key in "[a-z_]{1,20}",
        value in "[ -~]{0,40}",
        employees in proptest::option::of(0u64..1_000_000),
    ) {
        // Avoid colliding with the modelled field names.
        prop_assume!(key != "url" && key != "error" && key != "profile" && key != "schema_version");

        let mut raw = serde_json::json!({
            "schema_version": 1,
            "url": "https://www.linkedin.com/company/acme",
            "profile": {
                "company_size": [],
                "company_size_on_linkedin": employees,
            },
        });
        raw.as_object_mut()
            .unwrap()
            .insert(key.clone(), serde_json::Value::String(value.clone()));
        let payload: StoredPayload = serde_json::from_value(raw).unwrap();

        let serialized = serde_json::to_string(&payload).unwrap();
        let reparsed = StoredPayload::parse(&serialized).unwrap();

        prop_assert_eq!(reparsed.extra.get(&key).and_then(|v| v.as_str()), Some(value.as_str()));
        prop_assert_eq!(reparsed.profile.company_size_on_linkedin, employees);

        // Derived projection agrees with the stored figures.
        let derived = build_derived_patch(&reparsed);
        prop_assert_eq!(
            derived.iter().any(|f| f.name == fields::EMPLOYEES),
            employees.is_some()
        );
    }
}
