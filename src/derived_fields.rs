/// Derived-field pass: re-projects already-stored enrichment payloads
/// into normalized custom fields.
///
/// No enrichment lookup is made here; the only reads are the candidate
/// report and each client's stored payload.
use crate::errors::{AppError, ResultExt};
use crate::models::{fields, ClientRow, ClientUpdate, CustomField, StoredPayload};
use crate::queries;
use crate::services::HaloService;

/// Builds the sparse patch of derived fields for a stored payload.
///
/// Emits the employee count when the profile carries one and the
/// canonical URL when present; nothing else is touched.
pub fn build_derived_patch(payload: &StoredPayload) -> Vec<CustomField> {
    let mut patch = Vec::new();

    if let Some(count) = payload.profile.company_size_on_linkedin {
        patch.push(CustomField::new(fields::EMPLOYEES, count.to_string()));
    }
    if let Some(url) = payload.url.as_deref().filter(|url| !url.trim().is_empty()) {
        patch.push(CustomField::new(fields::LINKEDIN_URL, url));
    }

    patch
}

/// Outcome counters for one derived-field run.
#[derive(Debug, Default)]
pub struct DerivedSummary {
    pub total: usize,
    pub updated: usize,
    pub failures: usize,
}

/// Complete derived-field workflow for one run.
///
/// Per-client failures (missing or invalid stored payload, failed
/// update) are logged and the loop continues; a failed report is fatal.
pub async fn derive_employee_counts(halo: &HaloService) -> Result<DerivedSummary, AppError> {
    let clients = halo
        .run_report(queries::DERIVED_CANDIDATES)
        .await
        .context("Unable to load clients")?;

    tracing::info!("{} clients identified", clients.len());

    let mut summary = DerivedSummary {
        total: clients.len(),
        ..DerivedSummary::default()
    };

    for (index, client) in clients.iter().enumerate() {
        tracing::info!("({}/{}) {} {}", index + 1, clients.len(), client.id, client.name);

        match derive_one_client(halo, client).await {
            Ok(()) => {
                tracing::info!("Posted to Halo");
                summary.updated += 1;
            }
            Err(e) => {
                tracing::error!("Failed to derive fields for {}: {}", client.id, e);
                summary.failures += 1;
            }
        }
    }

    tracing::info!(
        "Derived-field pass complete: {} clients, {} updated, {} failures",
        summary.total,
        summary.updated,
        summary.failures
    );

    Ok(summary)
}

async fn derive_one_client(halo: &HaloService, client: &ClientRow) -> Result<(), AppError> {
    let detail = halo.fetch_client_detail(&client.id.to_string()).await?;

    let raw = detail.custom_field_str(fields::PAYLOAD).ok_or_else(|| {
        AppError::NotFound(format!(
            "Client {} has no {} custom field",
            client.id,
            fields::PAYLOAD
        ))
    })?;

    let payload = StoredPayload::parse(raw)?;
    let patch = build_derived_patch(&payload);
    if patch.is_empty() {
        tracing::warn!("Stored payload for {} carries no derivable fields", client.id);
    }

    let update = ClientUpdate::new(&client.id, patch);
    halo.update_client(&update).await.with_context(|| {
        format!(
            "Body: {}",
            serde_json::to_string(&[&update]).unwrap_or_default()
        )
    })
}
