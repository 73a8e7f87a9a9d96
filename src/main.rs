use std::sync::Arc;

use halo_proxycurl_sync::api_caller::{ApiCaller, RetryPolicy};
use halo_proxycurl_sync::config::Config;
use halo_proxycurl_sync::enrichment;
use halo_proxycurl_sync::logging;
use halo_proxycurl_sync::services::{HaloService, ProxycurlService};
use halo_proxycurl_sync::token::TokenProvider;

/// Main entry point for the enrichment sync run.
///
/// Acquires a bearer token once, fetches the candidate report and
/// processes each client sequentially: lookup strategies, patch
/// construction, update call. A failed report query is fatal; a failed
/// client update is logged and skipped.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing(&logging::log_file_from_env("logs.txt"))?;

    let config = Config::from_env()?;

    let caller = ApiCaller::new(RetryPolicy {
        max_attempts: config.retry_limit,
        backoff: config.retry_backoff,
    })?;

    let tokens = Arc::new(TokenProvider::new(caller.clone(), &config));
    tokens.acquire().await?;

    let halo = HaloService::new(caller.clone(), &config, Arc::clone(&tokens));
    let proxycurl = ProxycurlService::new(caller, &config);

    enrichment::sync_clients(&halo, &proxycurl).await?;

    Ok(())
}
