use crate::errors::AppError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONNECTION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Bounded fixed-interval retry for rate-limited calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// Pause between attempts after an HTTP 429.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(60),
        }
    }
}

/// Request body variants accepted by the caller.
///
/// JSON is the default wire format; the token exchange is the one
/// form-encoded call in the system.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A single outbound API call: method, target, auth and payload.
///
/// Built by the service clients and handed to [`ApiCaller`], which owns
/// header defaults, retry and error classification.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub base_url: String,
    pub endpoint: String,
    pub bearer_token: Option<String>,
    pub params: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Explicit header overrides; applied last, so they win over defaults.
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            base_url: base_url.into(),
            endpoint: endpoint.into(),
            bearer_token: None,
            params: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, base_url, endpoint)
    }

    pub fn post(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, base_url, endpoint)
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn form_body(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(pairs));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Shared HTTP primitive for every external call.
///
/// Owns authentication header injection, retry-on-rate-limit backoff
/// and response-code classification. One instance is built per run and
/// handed to all service clients.
#[derive(Clone)]
pub struct ApiCaller {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ApiCaller {
    pub fn new(retry: RetryPolicy) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::ExternalApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, retry })
    }

    /// Performs the call and parses the 2xx response body as JSON.
    pub async fn call(&self, request: &ApiRequest) -> Result<Value, AppError> {
        let response = self.dispatch(request).await?;
        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!(
                "Failed to parse response from {}: {}",
                request.endpoint, e
            ))
        })
    }

    /// Performs the call and deserializes the 2xx response into `T`.
    pub async fn call_as<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, AppError> {
        let response = self.dispatch(request).await?;
        response.json::<T>().await.map_err(|e| {
            AppError::ExternalApiError(format!(
                "Failed to parse response from {}: {}",
                request.endpoint, e
            ))
        })
    }

    /// Performs the call and returns the raw 2xx response unparsed.
    pub async fn call_raw(&self, request: &ApiRequest) -> Result<reqwest::Response, AppError> {
        self.dispatch(request).await
    }

    /// Issues the request with bounded retry.
    ///
    /// HTTP 429 sleeps the fixed backoff and retries; connection-reset
    /// class transport errors retry immediately. Any other non-2xx
    /// status fails the call at once with the status and body text.
    async fn dispatch(&self, call: &ApiRequest) -> Result<reqwest::Response, AppError> {
        let raw_url = format!("{}{}", call.base_url, call.endpoint);
        let url = if call.params.is_empty() {
            reqwest::Url::parse(&raw_url)
        } else {
            reqwest::Url::parse_with_params(&raw_url, &call.params)
        }
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL {}: {}", raw_url, e)))?;

        let mut last_status: u16 = 0;

        for attempt in 1..=self.retry.max_attempts {
            let mut builder = self
                .client
                .request(call.method.clone(), url.clone())
                .header(CONNECTION, "keep-alive");

            match &call.body {
                Some(RequestBody::Json(body)) => builder = builder.json(body),
                Some(RequestBody::Form(pairs)) => builder = builder.form(pairs),
                None => builder = builder.header(CONTENT_TYPE, "application/json"),
            }

            if let Some(ref token) = call.bearer_token {
                builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
            }

            // Applied last with replace semantics so explicit overrides
            // beat the defaults above.
            if !call.headers.is_empty() {
                let mut overrides = HeaderMap::new();
                for (name, value) in &call.headers {
                    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                        AppError::ExternalApiError(format!("Invalid header name {}: {}", name, e))
                    })?;
                    let value = HeaderValue::from_str(value).map_err(|e| {
                        AppError::ExternalApiError(format!("Invalid header value: {}", e))
                    })?;
                    overrides.insert(name, value);
                }
                builder = builder.headers(overrides);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    if is_connection_reset(&e) && attempt < self.retry.max_attempts {
                        tracing::warn!(
                            "Connection reset on {} {}. Retrying...",
                            call.method,
                            call.endpoint
                        );
                        continue;
                    }
                    return Err(AppError::ExternalApiError(format!(
                        "{} {} failed: {}",
                        call.method, call.endpoint, e
                    )));
                }
            };

            let status = response.status();
            last_status = status.as_u16();
            tracing::info!(
                "{}: {} ({}: {})",
                call.method,
                call.endpoint,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt < self.retry.max_attempts {
                    tracing::warn!(
                        "Rate limit reached. Retrying in {}s...",
                        self.retry.backoff.as_secs()
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                    continue;
                }
                return Err(AppError::RateLimitExhausted {
                    status: last_status,
                    attempts: attempt,
                });
            }

            if status == StatusCode::UNAUTHORIZED {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AppError::Unauthorized(format!(
                    "{} {} returned 401: {}",
                    call.method, call.endpoint, error_text
                )));
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AppError::ExternalApiError(format!(
                    "{} returned {}: {}",
                    call.endpoint, status, error_text
                )));
            }

            return Ok(response);
        }

        Err(AppError::RateLimitExhausted {
            status: last_status,
            attempts: self.retry.max_attempts,
        })
    }
}

/// Walks the source chain looking for a connection-reset class I/O error.
fn is_connection_reset(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            );
        }
        source = cause.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_creation() {
        let caller = ApiCaller::new(RetryPolicy::default());
        assert!(caller.is_ok());
    }

    #[test]
    fn test_request_builder_accumulates() {
        let request = ApiRequest::get("https://example.com", "/lookup")
            .bearer("token")
            .param("company_domain", "example.com")
            .header("Content-Type", "text/plain");

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.bearer_token.as_deref(), Some("token"));
        assert_eq!(request.params.len(), 1);
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff, Duration::from_secs(60));
    }
}
