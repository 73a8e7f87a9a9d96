//! Halo ↔ Proxycurl client-enrichment sync library
//!
//! This library synchronizes client records between the Halo
//! service-desk platform and the Proxycurl company-lookup API: it
//! fetches clients lacking enrichment data, resolves a company profile
//! by email domain with a name fallback, and writes the payload back
//! as custom fields. A second pass derives normalized fields from the
//! stored payload without another external lookup.
//!
//! # Modules
//!
//! - `api_caller`: The shared resilient HTTP primitive (retry, auth
//!   headers, error classification).
//! - `config`: Configuration management.
//! - `derived_fields`: The derived-field (employee count / URL) pass.
//! - `enrichment`: Resolution strategies and the sync workflow.
//! - `errors`: Error handling types.
//! - `logging`: Console + run-file tracing setup.
//! - `models`: Report rows, payload schema and patch types.
//! - `queries`: Fixed report SQL.
//! - `services`: External service clients (Halo, Proxycurl).
//! - `token`: OAuth client-credentials token provider.

pub mod api_caller;
pub mod config;
pub mod derived_fields;
pub mod enrichment;
pub mod errors;
pub mod logging;
pub mod models;
pub mod queries;
pub mod services;
pub mod token;
