/// Shared enrichment logic for the sync run.
///
/// The resolution half is pure control flow over the lookup client:
/// domain strategies in order, then a single name fallback, then a
/// synthesized failure payload. The effectful half turns an outcome
/// into a sparse custom-field patch and posts it, one client at a time.
use crate::errors::{AppError, ResultExt};
use crate::models::{fields, ClientRow, ClientUpdate, CustomField, StoredPayload};
use crate::queries;
use crate::services::{HaloService, ProxycurlService};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

/// Which strategy produced a client's payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedBy {
    /// An email-domain lookup was accepted; carries the winning domain.
    Domain(String),
    /// The display-name fallback was accepted.
    Name,
    /// Every strategy failed; the payload is the synthesized failure.
    Unresolved,
}

/// Terminal result of resolving one client.
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub resolved_by: ResolvedBy,
    pub payload: StoredPayload,
}

/// Splits the report's comma-separated domain column.
///
/// An empty column means zero domains; order is preserved because the
/// first accepted domain wins.
pub fn parse_email_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(String::from)
        .collect()
}

/// Validate an email domain before spending a lookup call on it.
///
/// Checks hostname shape only: dot-separated labels of letters, digits
/// and inner hyphens. Report data occasionally carries free-text junk
/// in the domain column.
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.len() < 4 || domain.len() > 253 || !domain.contains('.') {
        return false;
    }

    let domain_regex = Regex::new(
        r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .unwrap();

    if !domain_regex.is_match(domain) {
        tracing::warn!("Invalid email domain skipped: {}", domain);
        return false;
    }

    true
}

/// Resolves one client against the lookup provider.
///
/// Lookup errors and not-found responses are expected control flow:
/// they advance to the next strategy and are never surfaced as errors.
/// Exactly one state terminates the resolution.
pub async fn resolve_company(
    proxycurl: &ProxycurlService,
    client_name: &str,
    domains: &[String],
) -> EnrichmentOutcome {
    for (index, domain) in domains.iter().enumerate() {
        tracing::info!(
            "({}/{}) Searching based on domain: {}",
            index + 1,
            domains.len(),
            domain
        );

        match proxycurl.resolve_by_domain(domain).await {
            Ok(response) if response.is_match() => {
                tracing::info!("Match found using domain");
                return EnrichmentOutcome {
                    resolved_by: ResolvedBy::Domain(domain.clone()),
                    payload: response.into_payload(),
                };
            }
            Ok(_) => {
                tracing::info!("No match for domain: {}", domain);
            }
            Err(e) => {
                tracing::warn!("Proxycurl returned an error response: {}", e);
            }
        }
    }

    tracing::info!("Unable to find a successful match using domain, attempting to search using name...");

    match proxycurl.resolve_by_name(client_name).await {
        Ok(response) if response.is_match() => {
            tracing::info!("Match found using name");
            return EnrichmentOutcome {
                resolved_by: ResolvedBy::Name,
                payload: response.into_payload(),
            };
        }
        Ok(_) => {
            tracing::info!("No match for name: {}", client_name);
        }
        Err(e) => {
            tracing::warn!("Proxycurl returned an error response: {}", e);
        }
    }

    tracing::warn!("Unable to find a successful match using domain or name");
    EnrichmentOutcome {
        resolved_by: ResolvedBy::Unresolved,
        payload: StoredPayload::unresolved("Unable to find a successful match using domain or name"),
    }
}

/// Builds the sparse patch for a resolution outcome.
///
/// Bound fields are emitted only when the bound exists. The payload and
/// the last-synced stamp are always written; the stamp is what excludes
/// the client from the next report run.
pub fn build_patch(
    payload: &StoredPayload,
    synced_at: DateTime<Utc>,
) -> Result<Vec<CustomField>, AppError> {
    let mut patch = Vec::new();

    if let Some(lower) = payload.profile.size_lower() {
        patch.push(CustomField::new(fields::SIZE_LOWER, lower.to_string()));
    }
    if let Some(upper) = payload.profile.size_upper() {
        patch.push(CustomField::new(fields::SIZE_UPPER, upper.to_string()));
    }

    let serialized = serde_json::to_string(payload)
        .map_err(|e| AppError::InvalidPayload(format!("Failed to serialize payload: {}", e)))?;
    patch.push(CustomField::new(fields::PAYLOAD, serialized));
    patch.push(CustomField::new(
        fields::LAST_SYNCED,
        synced_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    ));

    Ok(patch)
}

/// Outcome counters for one sync run.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub total: usize,
    pub updated: usize,
    pub update_failures: usize,
    pub resolved_by_domain: usize,
    pub resolved_by_name: usize,
    pub unresolved: usize,
}

/// Complete enrichment workflow for one run.
///
/// Fetches the candidate report, resolves each client sequentially and
/// posts its patch. A failed update leaves that client unsynced for the
/// next run and the loop continues; a failed report is fatal.
pub async fn sync_clients(
    halo: &HaloService,
    proxycurl: &ProxycurlService,
) -> Result<SyncSummary, AppError> {
    let clients = halo
        .run_report(queries::ENRICHMENT_CANDIDATES)
        .await
        .context("Unable to load clients")?;

    tracing::info!("{} clients identified", clients.len());

    let mut summary = SyncSummary {
        total: clients.len(),
        ..SyncSummary::default()
    };

    for (index, client) in clients.iter().enumerate() {
        tracing::info!("({}/{}) {} {}", index + 1, clients.len(), client.id, client.name);

        if let Err(e) = sync_one_client(halo, proxycurl, client, &mut summary).await {
            tracing::error!("Failed to post to Halo: {}", e);
            summary.update_failures += 1;
            continue;
        }

        summary.updated += 1;
    }

    tracing::info!(
        "Sync complete: {} clients, {} updated, {} update failures ({} by domain, {} by name, {} unresolved)",
        summary.total,
        summary.updated,
        summary.update_failures,
        summary.resolved_by_domain,
        summary.resolved_by_name,
        summary.unresolved
    );

    Ok(summary)
}

async fn sync_one_client(
    halo: &HaloService,
    proxycurl: &ProxycurlService,
    client: &ClientRow,
    summary: &mut SyncSummary,
) -> Result<(), AppError> {
    let domains: Vec<String> = client
        .email_domains
        .as_deref()
        .map(parse_email_domains)
        .unwrap_or_default()
        .into_iter()
        .filter(|domain| is_valid_domain(domain))
        .collect();

    tracing::info!("{} domains found", domains.len());

    let outcome = resolve_company(proxycurl, &client.name, &domains).await;
    match &outcome.resolved_by {
        ResolvedBy::Domain(_) => summary.resolved_by_domain += 1,
        ResolvedBy::Name => summary.resolved_by_name += 1,
        ResolvedBy::Unresolved => summary.unresolved += 1,
    }

    let patch = build_patch(&outcome.payload, Utc::now())?;
    let update = ClientUpdate::new(&client.id, patch);

    halo.update_client(&update).await.with_context(|| {
        format!(
            "Body: {}",
            serde_json::to_string(&[&update]).unwrap_or_default()
        )
    })?;

    tracing::info!("Posted to Halo");
    Ok(())
}
