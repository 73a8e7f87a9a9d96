use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::AppError;

/// Version stamped into every payload this system writes.
///
/// The derived-field pass refuses payloads from a newer writer instead
/// of blindly parsing them. Legacy payloads without the field parse as
/// version 0 and are still accepted.
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

/// Custom-field names on the Halo client record.
pub mod fields {
    /// Full enrichment payload, JSON-stringified.
    pub const PAYLOAD: &str = "CFProxycurlPayload";
    /// ISO-8601 stamp that excludes the client from the next report run.
    pub const LAST_SYNCED: &str = "CFProxycurlLastSynced";
    /// Lower bound of the LinkedIn company-size range.
    pub const SIZE_LOWER: &str = "CFLinkedInCompanySizeLower";
    /// Upper bound of the LinkedIn company-size range.
    pub const SIZE_UPPER: &str = "CFLinkedInCompanySizeUpper";
    /// Exact employee count reported by LinkedIn.
    pub const EMPLOYEES: &str = "CFEmployeesInLinkedIn";
    /// Canonical LinkedIn company profile URL.
    pub const LINKEDIN_URL: &str = "CFLinkedInURL";
}

// ============ Report Models ============

/// Client identifier as it appears in report rows.
///
/// Halo reports surface the area ID as a number; the update endpoint
/// wants it as a string. Accept both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientId::Number(n) => write!(f, "{}", n),
            ClientId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One row of the client report.
///
/// Column aliases are fixed by the report SQL; both report definitions
/// share the ID and name columns, only the sync report carries domains.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRow {
    #[serde(rename = "Client ID")]
    pub id: ClientId,
    #[serde(rename = "Client")]
    pub name: String,
    #[serde(rename = "Email Domains", default)]
    pub email_domains: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportResponse {
    pub report: Report,
}

#[derive(Debug, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub rows: Vec<ClientRow>,
}

// ============ Client Detail Models ============

/// A custom field as returned by the client-detail endpoint.
///
/// Values are not guaranteed to be strings for every field type, so
/// keep the raw JSON value and let callers pick what they need.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailField {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientDetail {
    #[serde(default)]
    pub customfields: Vec<DetailField>,
}

impl ClientDetail {
    /// Finds a custom field by name and returns its value as a string,
    /// if it holds one.
    pub fn custom_field_str(&self, name: &str) -> Option<&str> {
        self.customfields
            .iter()
            .find(|field| field.name == name)
            .and_then(|field| field.value.as_str())
    }
}

// ============ Patch Models ============

/// One (name, value) pair of a sparse client patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    pub value: String,
}

impl CustomField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Body element for the client-update endpoint.
///
/// The endpoint takes an array of these; absent fields are left
/// untouched server-side.
#[derive(Debug, Clone, Serialize)]
pub struct ClientUpdate {
    pub isclientdetails: bool,
    pub id: String,
    pub customfields: Vec<CustomField>,
}

impl ClientUpdate {
    pub fn new(id: &ClientId, customfields: Vec<CustomField>) -> Self {
        Self {
            isclientdetails: true,
            id: id.to_string(),
            customfields,
        }
    }
}

// ============ Enrichment Payload Models ============

/// Company profile section of the enrichment payload.
///
/// `company_size` is a `[lower, upper]` bounds pair where either end
/// may be null; the provider's remaining profile fields ride along
/// untouched in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub company_size: Vec<Option<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size_on_linkedin: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CompanyProfile {
    pub fn size_lower(&self) -> Option<u64> {
        self.company_size.first().copied().flatten()
    }

    pub fn size_upper(&self) -> Option<u64> {
        self.company_size.get(1).copied().flatten()
    }
}

/// The payload stored verbatim under the payload custom field.
///
/// Written for every client that goes through resolution, success or
/// not, so already-attempted clients are not re-looked-up every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPayload {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub profile: CompanyProfile,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl StoredPayload {
    /// Synthesized failure payload: error marker plus empty bounds.
    pub fn unresolved(reason: impl Into<String>) -> Self {
        Self {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            url: None,
            error: Some(reason.into()),
            profile: CompanyProfile::default(),
            extra: serde_json::Map::new(),
        }
    }

    /// Parses a stored payload string, rejecting payloads written by a
    /// newer schema than this binary understands.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let payload: StoredPayload = serde_json::from_str(raw)
            .map_err(|e| AppError::InvalidPayload(format!("Stored payload is not valid JSON: {}", e)))?;

        if payload.schema_version > PAYLOAD_SCHEMA_VERSION {
            return Err(AppError::InvalidPayload(format!(
                "Stored payload schema version {} is newer than supported version {}",
                payload.schema_version, PAYLOAD_SCHEMA_VERSION
            )));
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_accepts_number_and_text() {
        let row: ClientRow =
            serde_json::from_str(r#"{"Client ID": 42, "Client": "Acme"}"#).unwrap();
        assert_eq!(row.id.to_string(), "42");

        let row: ClientRow =
            serde_json::from_str(r#"{"Client ID": "A-42", "Client": "Acme"}"#).unwrap();
        assert_eq!(row.id.to_string(), "A-42");
    }

    #[test]
    fn test_profile_bounds() {
        let profile: CompanyProfile =
            serde_json::from_str(r#"{"company_size": [11, 50]}"#).unwrap();
        assert_eq!(profile.size_lower(), Some(11));
        assert_eq!(profile.size_upper(), Some(50));

        let open_ended: CompanyProfile =
            serde_json::from_str(r#"{"company_size": [10001, null]}"#).unwrap();
        assert_eq!(open_ended.size_lower(), Some(10001));
        assert_eq!(open_ended.size_upper(), None);

        assert_eq!(CompanyProfile::default().size_lower(), None);
    }

    #[test]
    fn test_unresolved_payload_shape() {
        let payload = StoredPayload::unresolved("no match");
        assert!(payload.url.is_none());
        assert!(!payload.error.as_deref().unwrap_or_default().is_empty());
        assert!(payload.profile.company_size.is_empty());
    }

    #[test]
    fn test_parse_rejects_newer_schema() {
        let raw = format!(r#"{{"schema_version": {}}}"#, PAYLOAD_SCHEMA_VERSION + 1);
        assert!(StoredPayload::parse(&raw).is_err());
    }

    #[test]
    fn test_parse_accepts_legacy_payload() {
        // Payloads written before versioning have no schema_version field.
        let raw = r#"{"url": "https://www.linkedin.com/company/acme", "profile": {"company_size": [11, 50], "company_size_on_linkedin": 37}}"#;
        let payload = StoredPayload::parse(raw).unwrap();
        assert_eq!(payload.schema_version, 0);
        assert_eq!(payload.profile.company_size_on_linkedin, Some(37));
    }
}
