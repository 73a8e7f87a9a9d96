use crate::api_caller::{ApiCaller, ApiRequest};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{
    ClientDetail, ClientRow, ClientUpdate, CompanyProfile, ReportResponse, StoredPayload,
    PAYLOAD_SCHEMA_VERSION,
};
use crate::token::TokenProvider;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

// ============ Halo Service-Desk Integration ============

/// Client for the Halo reporting and client-update endpoints.
///
/// Every call goes through the shared [`ApiCaller`]; a 401 triggers one
/// token refresh and a single retry before the error is surfaced.
pub struct HaloService {
    caller: ApiCaller,
    base_url: String,
    tokens: Arc<TokenProvider>,
}

impl HaloService {
    pub fn new(caller: ApiCaller, config: &Config, tokens: Arc<TokenProvider>) -> Self {
        Self {
            caller,
            base_url: config.halo_base_url.clone(),
            tokens,
        }
    }

    /// Runs a report query and returns its rows.
    pub async fn run_report(&self, sql: &str) -> Result<Vec<ClientRow>, AppError> {
        tracing::info!("Running client report");

        let body = json!([{
            "sql": sql,
            "_loadreportonly": true,
        }]);

        let response: ReportResponse = self
            .call_with_refresh(|token| {
                ApiRequest::post(self.base_url.clone(), "/report")
                    .bearer(token)
                    .json_body(body.clone())
            })
            .await?;

        Ok(response.report.rows)
    }

    /// Fetches a single client record with its custom-field details.
    pub async fn fetch_client_detail(&self, client_id: &str) -> Result<ClientDetail, AppError> {
        tracing::info!("Fetching client detail for {}", client_id);

        let endpoint = format!("/client/{}", client_id);
        self.call_with_refresh(|token| {
            ApiRequest::get(self.base_url.clone(), endpoint.clone())
                .bearer(token)
                .param("includedetails", "true")
        })
        .await
    }

    /// Applies a sparse custom-field patch to a client record.
    pub async fn update_client(&self, update: &ClientUpdate) -> Result<(), AppError> {
        tracing::info!("Updating client {}", update.id);

        let body = serde_json::to_value(vec![update]).map_err(|e| {
            AppError::InvalidPayload(format!("Failed to serialize client update: {}", e))
        })?;

        let _: Value = self
            .call_with_refresh(|token| {
                ApiRequest::post(self.base_url.clone(), "/client")
                    .bearer(token)
                    .json_body(body.clone())
            })
            .await?;

        Ok(())
    }

    /// Issues a call with the current token, refreshing and retrying
    /// exactly once if Halo rejects it.
    async fn call_with_refresh<T: DeserializeOwned>(
        &self,
        build: impl Fn(&str) -> ApiRequest,
    ) -> Result<T, AppError> {
        let token = self
            .tokens
            .bearer()
            .ok_or_else(|| AppError::AuthError("No access token held for Halo".to_string()))?;

        match self.caller.call_as::<T>(&build(&token)).await {
            Err(AppError::Unauthorized(msg)) => {
                tracing::warn!("Halo rejected the token ({}), refreshing and retrying once", msg);
                let fresh = self.tokens.refresh().await?;
                self.caller.call_as::<T>(&build(&fresh)).await
            }
            other => other,
        }
    }
}

// ============ Proxycurl Lookup Integration ============

/// Response of the company-resolve endpoint.
///
/// A real match carries a canonical profile URL; anything else is
/// treated as not-found by the resolver. Provider fields we do not
/// model ride along in `extra` and are stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub profile: CompanyProfile,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl LookupResponse {
    /// A result is accepted only if it has a non-empty canonical URL.
    pub fn is_match(&self) -> bool {
        self.url.as_deref().map(str::trim).is_some_and(|url| !url.is_empty())
    }

    /// Converts an accepted response into the payload stored on the
    /// client record, stamping the current schema version.
    pub fn into_payload(self) -> StoredPayload {
        StoredPayload {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            url: self.url,
            error: None,
            profile: self.profile,
            extra: self.extra,
        }
    }
}

/// Client for the Proxycurl company-lookup endpoint.
///
/// Uses a static bearer key; there is no refresh flow on this side.
pub struct ProxycurlService {
    caller: ApiCaller,
    base_url: String,
    api_key: String,
}

impl ProxycurlService {
    pub fn new(caller: ApiCaller, config: &Config) -> Self {
        Self {
            caller,
            base_url: config.proxycurl_base_url.clone(),
            api_key: config.proxycurl_api_key.clone(),
        }
    }

    /// Looks up a company profile by email domain.
    pub async fn resolve_by_domain(&self, domain: &str) -> Result<LookupResponse, AppError> {
        let request = ApiRequest::get(self.base_url.clone(), "/linkedin/company/resolve")
            .bearer(self.api_key.clone())
            .param("company_domain", domain)
            .param("enrich_profile", "enrich");

        self.caller.call_as(&request).await
    }

    /// Looks up a company profile by display name.
    pub async fn resolve_by_name(&self, name: &str) -> Result<LookupResponse, AppError> {
        let request = ApiRequest::get(self.base_url.clone(), "/linkedin/company/resolve")
            .bearer(self.api_key.clone())
            .param("company_name", name)
            .param("enrich_profile", "enrich");

        self.caller.call_as(&request).await
    }
}
