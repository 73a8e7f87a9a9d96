//! Batch pass deriving normalized fields from stored enrichment
//! payloads.
//!
//! Consumes clients whose payload already carries a LinkedIn size
//! figure but whose employees field is still unset; no enrichment
//! lookup is made.

use std::sync::Arc;

use halo_proxycurl_sync::api_caller::{ApiCaller, RetryPolicy};
use halo_proxycurl_sync::config::Config;
use halo_proxycurl_sync::derived_fields;
use halo_proxycurl_sync::logging;
use halo_proxycurl_sync::services::HaloService;
use halo_proxycurl_sync::token::TokenProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing(&logging::log_file_from_env("logs1.txt"))?;

    let config = Config::from_env()?;

    let caller = ApiCaller::new(RetryPolicy {
        max_attempts: config.retry_limit,
        backoff: config.retry_backoff,
    })?;

    let tokens = Arc::new(TokenProvider::new(caller.clone(), &config));
    tokens.acquire().await?;

    let halo = HaloService::new(caller, &config, Arc::clone(&tokens));

    derived_fields::derive_employee_counts(&halo).await?;

    Ok(())
}
