use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub halo_base_url: String,
    pub halo_auth_url: String,
    pub halo_client_id: String,
    pub halo_client_secret: String,
    pub proxycurl_base_url: String,
    pub proxycurl_api_key: String,
    /// Total attempts per call, including the first.
    pub retry_limit: u32,
    /// Fixed pause between rate-limited attempts.
    pub retry_backoff: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            halo_base_url: {
                let url = std::env::var("HALO_BASE_URL")
                    .unwrap_or_else(|_| "https://halo.haloservicedesk.com/api".to_string());
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("HALO_BASE_URL must start with http:// or https://");
                }
                url
            },
            halo_auth_url: {
                let url = std::env::var("HALO_AUTH_URL")
                    .unwrap_or_else(|_| "https://halo.haloservicedesk.com/auth/token".to_string());
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("HALO_AUTH_URL must start with http:// or https://");
                }
                url
            },
            halo_client_id: std::env::var("HALO_CLIENT_ID")
                .map_err(|_| anyhow::anyhow!("HALO_CLIENT_ID environment variable required"))
                .and_then(|id| {
                    if id.trim().is_empty() {
                        anyhow::bail!("HALO_CLIENT_ID cannot be empty");
                    }
                    Ok(id)
                })?,
            halo_client_secret: std::env::var("HALO_CLIENT_SECRET")
                .map_err(|_| anyhow::anyhow!("HALO_CLIENT_SECRET environment variable required"))
                .and_then(|secret| {
                    if secret.trim().is_empty() {
                        anyhow::bail!("HALO_CLIENT_SECRET cannot be empty");
                    }
                    Ok(secret)
                })?,
            proxycurl_base_url: {
                let url = std::env::var("PROXYCURL_BASE_URL")
                    .unwrap_or_else(|_| "https://nubela.co/proxycurl/api".to_string());
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("PROXYCURL_BASE_URL must start with http:// or https://");
                }
                url
            },
            proxycurl_api_key: std::env::var("PROXYCURL_API_KEY")
                .map_err(|_| anyhow::anyhow!("PROXYCURL_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("PROXYCURL_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            retry_limit: std::env::var("RETRY_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_LIMIT must be a positive integer"))?,
            retry_backoff: std::env::var("RETRY_BACKOFF_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| anyhow::anyhow!("RETRY_BACKOFF_SECS must be a number of seconds"))?,
        };

        if config.retry_limit == 0 {
            anyhow::bail!("RETRY_LIMIT must be at least 1");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Halo Base URL: {}", config.halo_base_url);
        tracing::debug!("Halo Auth URL: {}", config.halo_auth_url);
        tracing::debug!("Proxycurl Base URL: {}", config.proxycurl_base_url);
        tracing::debug!(
            "Retry policy: {} attempts, {}s backoff",
            config.retry_limit,
            config.retry_backoff.as_secs()
        );

        Ok(config)
    }
}
