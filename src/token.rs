use crate::api_caller::{ApiCaller, ApiRequest};
use crate::config::Config;
use crate::errors::AppError;
use serde::Deserialize;
use std::sync::RwLock;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges OAuth client credentials for a bearer token and holds it
/// for the run.
///
/// The token is handed to call sites as an explicit value rather than
/// living in process-global state. `refresh` re-runs the exchange and
/// swaps the stored token; the Halo service uses it to retry exactly
/// once after a 401.
pub struct TokenProvider {
    caller: ApiCaller,
    auth_url: String,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<String>>,
}

impl TokenProvider {
    pub fn new(caller: ApiCaller, config: &Config) -> Self {
        Self {
            caller,
            auth_url: config.halo_auth_url.clone(),
            client_id: config.halo_client_id.clone(),
            client_secret: config.halo_client_secret.clone(),
            token: RwLock::new(None),
        }
    }

    /// Performs the credential exchange and stores the resulting token.
    ///
    /// A failed exchange is an error for the whole run: every
    /// downstream Halo call needs this token.
    pub async fn acquire(&self) -> Result<String, AppError> {
        tracing::info!("Obtaining access token...");

        let request = ApiRequest::post(self.auth_url.clone(), "").form_body(vec![
            ("grant_type".to_string(), "client_credentials".to_string()),
            ("scope".to_string(), "all".to_string()),
            ("client_id".to_string(), self.client_id.clone()),
            ("client_secret".to_string(), self.client_secret.clone()),
        ]);

        let response: TokenResponse = self
            .caller
            .call_as(&request)
            .await
            .map_err(|e| AppError::AuthError(format!("Token exchange failed: {}", e)))?;

        if response.access_token.trim().is_empty() {
            return Err(AppError::AuthError(
                "Token endpoint returned an empty access_token".to_string(),
            ));
        }

        let mut guard = self
            .token
            .write()
            .map_err(|_| AppError::AuthError("Token lock poisoned".to_string()))?;
        *guard = Some(response.access_token.clone());

        Ok(response.access_token)
    }

    /// Returns the currently held token, if one has been acquired.
    pub fn bearer(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    /// Re-runs the credential exchange, replacing the stored token.
    pub async fn refresh(&self) -> Result<String, AppError> {
        tracing::warn!("Refreshing access token...");
        self.acquire().await
    }
}
