/// Unit tests for enrichment logic
/// Tests domain parsing/validation, patch construction and the stored
/// payload schema
use halo_proxycurl_sync::enrichment::{build_patch, is_valid_domain, parse_email_domains};

#[cfg(test)]
mod domain_parsing_tests {
    use super::*;

    #[test]
    fn test_splits_comma_separated_domains() {
        assert_eq!(
            parse_email_domains("acme.com,acme.co.uk"),
            vec!["acme.com".to_string(), "acme.co.uk".to_string()]
        );
    }

    #[test]
    fn test_empty_column_means_zero_domains() {
        assert!(parse_email_domains("").is_empty());
        assert!(parse_email_domains(" , ,").is_empty());
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(
            parse_email_domains(" acme.com , widgets.io "),
            vec!["acme.com".to_string(), "widgets.io".to_string()]
        );
    }

    #[test]
    fn test_preserves_order() {
        // First accepted domain wins, so order matters.
        assert_eq!(
            parse_email_domains("z.com,a.com,m.com"),
            vec!["z.com".to_string(), "a.com".to_string(), "m.com".to_string()]
        );
    }
}

#[cfg(test)]
mod domain_validation_tests {
    use super::*;

    #[test]
    fn test_valid_domains() {
        assert!(is_valid_domain("acme.com"));
        assert!(is_valid_domain("sub.acme.co.uk"));
        assert!(is_valid_domain("my-company.io"));
        assert!(is_valid_domain("a1.b2.c3.net"));
    }

    #[test]
    fn test_invalid_domains() {
        // No dot
        assert!(!is_valid_domain("localhost"));
        // Too short / empty
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("a.b"));
        // Free-text junk from the report column
        assert!(!is_valid_domain("n/a"));
        assert!(!is_valid_domain("no domain"));
        assert!(!is_valid_domain("user@acme.com"));
        // Hyphens at label edges
        assert!(!is_valid_domain("-acme.com"));
        assert!(!is_valid_domain("acme-.com"));
    }
}

#[cfg(test)]
mod patch_construction_tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use halo_proxycurl_sync::models::{fields, StoredPayload};

    fn payload_with_bounds(lower: Option<u64>, upper: Option<u64>) -> StoredPayload {
        let raw = serde_json::json!({
            "schema_version": 1,
            "url": "https://www.linkedin.com/company/acme",
            "profile": { "company_size": [lower, upper] }
        });
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_patch_with_both_bounds() {
        let payload = payload_with_bounds(Some(11), Some(50));
        let synced_at = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let patch = build_patch(&payload, synced_at).unwrap();

        assert_eq!(patch.len(), 4);
        assert_eq!(patch[0].name, fields::SIZE_LOWER);
        assert_eq!(patch[0].value, "11");
        assert_eq!(patch[1].name, fields::SIZE_UPPER);
        assert_eq!(patch[1].value, "50");
        assert_eq!(patch[2].name, fields::PAYLOAD);
        assert_eq!(patch[3].name, fields::LAST_SYNCED);
    }

    #[test]
    fn test_bounds_use_distinct_field_names() {
        let payload = payload_with_bounds(Some(11), Some(50));
        let patch = build_patch(&payload, Utc::now()).unwrap();

        let lower = patch.iter().find(|f| f.name == fields::SIZE_LOWER);
        let upper = patch.iter().find(|f| f.name == fields::SIZE_UPPER);
        assert_eq!(lower.map(|f| f.value.as_str()), Some("11"));
        assert_eq!(upper.map(|f| f.value.as_str()), Some("50"));
    }

    #[test]
    fn test_patch_is_sparse_without_bounds() {
        let payload = StoredPayload::unresolved("no match");
        let patch = build_patch(&payload, Utc::now()).unwrap();

        // Only the payload itself and the sync stamp.
        assert_eq!(patch.len(), 2);
        assert_eq!(patch[0].name, fields::PAYLOAD);
        assert_eq!(patch[1].name, fields::LAST_SYNCED);
    }

    #[test]
    fn test_open_ended_upper_bound_omitted() {
        let payload = payload_with_bounds(Some(10001), None);
        let patch = build_patch(&payload, Utc::now()).unwrap();

        assert!(patch.iter().any(|f| f.name == fields::SIZE_LOWER));
        assert!(!patch.iter().any(|f| f.name == fields::SIZE_UPPER));
    }

    #[test]
    fn test_stored_payload_round_trips_through_patch() {
        let payload = payload_with_bounds(Some(11), Some(50));
        let patch = build_patch(&payload, Utc::now()).unwrap();

        let stored = patch.iter().find(|f| f.name == fields::PAYLOAD).unwrap();
        let reparsed = StoredPayload::parse(&stored.value).unwrap();
        assert_eq!(reparsed.url, payload.url);
        assert_eq!(reparsed.profile.size_lower(), Some(11));
        assert_eq!(reparsed.profile.size_upper(), Some(50));
    }

    #[test]
    fn test_timestamp_is_iso_8601_utc() {
        let payload = StoredPayload::unresolved("no match");
        let synced_at = Utc.with_ymd_and_hms(2026, 8, 7, 12, 30, 45).unwrap();
        let patch = build_patch(&payload, synced_at).unwrap();

        let stamp = &patch.iter().find(|f| f.name == fields::LAST_SYNCED).unwrap().value;
        assert_eq!(stamp, "2026-08-07T12:30:45.000Z");
    }
}

#[cfg(test)]
mod derived_patch_tests {
    use halo_proxycurl_sync::derived_fields::build_derived_patch;
    use halo_proxycurl_sync::models::{fields, StoredPayload};

    #[test]
    fn test_projects_employee_count_and_url() {
        let payload =
            StoredPayload::parse(r#"{"url":"https://x","profile":{"company_size_on_linkedin":50}}"#)
                .unwrap();
        let patch = build_derived_patch(&payload);

        assert_eq!(patch.len(), 2);
        assert!(patch.iter().any(|f| f.name == fields::EMPLOYEES && f.value == "50"));
        assert!(patch.iter().any(|f| f.name == fields::LINKEDIN_URL && f.value == "https://x"));
    }

    #[test]
    fn test_empty_patch_for_failure_payload() {
        let payload = StoredPayload::unresolved("no match");
        assert!(build_derived_patch(&payload).is_empty());
    }

    #[test]
    fn test_url_only_payload() {
        let payload = StoredPayload::parse(r#"{"url":"https://x","profile":{}}"#).unwrap();
        let patch = build_derived_patch(&payload);

        assert_eq!(patch.len(), 1);
        assert_eq!(patch[0].name, fields::LINKEDIN_URL);
    }
}

#[cfg(test)]
mod stored_payload_tests {
    use halo_proxycurl_sync::models::{StoredPayload, PAYLOAD_SCHEMA_VERSION};

    #[test]
    fn test_unknown_provider_fields_survive_round_trip() {
        let raw = r#"{
            "schema_version": 1,
            "url": "https://www.linkedin.com/company/acme",
            "profile": { "company_size": [11, 50], "industry": "Software", "founded_year": 2001 },
            "last_updated": "2026-01-01"
        }"#;
        let payload = StoredPayload::parse(raw).unwrap();

        assert_eq!(payload.profile.extra["industry"], "Software");
        assert_eq!(payload.extra["last_updated"], "2026-01-01");

        let serialized = serde_json::to_string(&payload).unwrap();
        let reparsed = StoredPayload::parse(&serialized).unwrap();
        assert_eq!(reparsed.profile.extra["founded_year"], 2001);
    }

    #[test]
    fn test_rejects_payload_from_newer_writer() {
        let raw = format!(r#"{{"schema_version": {}}}"#, PAYLOAD_SCHEMA_VERSION + 1);
        assert!(StoredPayload::parse(&raw).is_err());
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(StoredPayload::parse("not json").is_err());
        assert!(StoredPayload::parse("").is_err());
    }
}

#[cfg(test)]
mod error_handling_tests {
    use halo_proxycurl_sync::errors::{AppError, ResultExt};

    #[test]
    fn test_error_display() {
        let error = AppError::ExternalApiError("Connection timeout".to_string());
        let display = format!("{}", error);
        assert!(display.contains("External API error"));
        assert!(display.contains("Connection timeout"));

        let error = AppError::RateLimitExhausted {
            status: 429,
            attempts: 5,
        };
        let display = format!("{}", error);
        assert!(display.contains("5 attempts"));
        assert!(display.contains("429"));
    }

    #[test]
    fn test_context_chains() {
        let result: Result<(), AppError> =
            Err(AppError::NotFound("client 7".to_string())).context("Unable to load clients");
        let display = format!("{}", result.unwrap_err());
        assert!(display.contains("Unable to load clients"));
        assert!(display.contains("client 7"));
    }
}
