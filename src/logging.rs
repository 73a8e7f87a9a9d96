use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes tracing with a console layer and an append-mode file
/// layer mirroring the same lines without ANSI codes.
///
/// Each binary passes its own run log file; `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing(log_file: &str) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", log_file, e))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "halo_proxycurl_sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .init();

    Ok(())
}

/// Resolves the run log file: `LOG_FILE` when set, the binary's default
/// otherwise.
pub fn log_file_from_env(default: &str) -> String {
    std::env::var("LOG_FILE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
