// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare DNS provider for the DDNS system.
//
// ## Reconciliation
//
// Every reconciliation walks the same three steps, one HTTP request at a
// time:
//
// 1. **Zone**: `GET /zones` and take the first zone (in the order Cloudflare
//    returns them) whose name is a suffix of the record name
// 2. **Record**: `GET /zones/:zone_id/dns_records` and take the first record
//    whose name equals the record name exactly (the type is not compared)
// 3. **Write**: if no record was found, `POST` a new one; then `PATCH` the
//    record with the desired content
//
// The zone step does not look for the longest match. With both `b.com` and
// `a.b.com` visible to the token, whichever Cloudflare lists first wins.
//
// The `PATCH` right after a `POST` repeats what the create already wrote.
// It costs one extra round trip on first creation and keeps both paths
// ending in the same call.
//
// ## Response Handling
//
// Responses are decoded into typed envelopes regardless of the HTTP status
// (Cloudflare reports failures in the body):
//
// - `success: false` → `Error::Provider` carrying the first error message
// - body that is not the expected shape → `Error::MalformedResponse`
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - Debug output redacts the token
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones`
// - List DNS Records: GET `/zones/:zone_id/dns_records`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::{DnsProvider, Error, ReconcileOutcome, ReconciliationTarget, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL value Cloudflare treats as "automatic"
pub const AUTOMATIC_TTL: u32 = 1;

/// Translate the configured TTL into the value sent to Cloudflare
///
/// 0 means "provider default" and becomes [`AUTOMATIC_TTL`]; any other value
/// is passed through.
pub fn effective_ttl(ttl: u32) -> u32 {
    if ttl == 0 { AUTOMATIC_TTL } else { ttl }
}

// ============================================================
// API Types
// ============================================================

/// Common response envelope
///
/// `result` is decoded separately, once `success` has been checked.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// A zone as listed by `GET /zones`
#[derive(Debug, Clone, Deserialize)]
struct Zone {
    id: String,
    name: String,
}

/// A DNS record as listed by `GET /zones/:zone_id/dns_records`
#[derive(Debug, Clone, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    record_type: String,
    #[serde(default)]
    content: String,
}

/// Body of create and update requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct RecordPayload<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    proxied: bool,
    ttl: u32,
}

impl<'a> From<&'a ReconciliationTarget> for RecordPayload<'a> {
    fn from(target: &'a ReconciliationTarget) -> Self {
        Self {
            record_type: target.record_type.as_str(),
            name: &target.domain_name,
            content: &target.desired_content,
            proxied: target.proxied,
            ttl: effective_ttl(target.ttl),
        }
    }
}

// ============================================================
// Provider
// ============================================================

/// Cloudflare DNS provider
///
/// Stateless between calls: zone and record ids are looked up on every
/// reconciliation and never cached.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a provider talking to the public Cloudflare API
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be
    /// built.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_token, CLOUDFLARE_API_BASE)
    }

    /// Create a provider talking to a custom API base URL
    pub fn with_base_url(api_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Find the zone holding `domain`
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones
    /// Authorization: Bearer <token>
    /// ```
    async fn get_zone_id(&self, domain: &str) -> Result<String> {
        tracing::debug!("Looking up zone for: {}", domain);

        let url = format!("{}/zones", self.base_url);
        let zones: Vec<Zone> = self.call(Method::GET, &url, None).await?;

        let zone = zones
            .into_iter()
            .find(|zone| domain.ends_with(&zone.name))
            .ok_or_else(|| Error::zone_not_found(domain))?;

        tracing::debug!("Found zone {} ({})", zone.name, zone.id);
        Ok(zone.id)
    }

    /// Find the record named exactly `domain`, if any
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records
    /// Authorization: Bearer <token>
    /// ```
    async fn get_record_id(&self, zone_id: &str, domain: &str) -> Result<Option<String>> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let records: Vec<DnsRecord> = self.call(Method::GET, &url, None).await?;

        let record = records.into_iter().find(|record| record.name == domain);
        match &record {
            Some(record) => tracing::debug!(
                "Found record {} ({} {} -> {})",
                record.id,
                record.record_type,
                record.name,
                record.content
            ),
            None => tracing::debug!("No record named {} in zone {}", domain, zone_id),
        }

        Ok(record.map(|record| record.id))
    }

    /// Create a record and return its id
    async fn create_record(&self, zone_id: &str, payload: &RecordPayload<'_>) -> Result<String> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let created: DnsRecord = self.call(Method::POST, &url, Some(payload)).await?;

        tracing::debug!("Created record {} for {}", created.id, payload.name);
        Ok(created.id)
    }

    /// Overwrite a record with the payload
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload<'_>,
    ) -> Result<()> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, zone_id, record_id
        );
        let _: serde_json::Value = self.call(Method::PATCH, &url, Some(payload)).await?;

        tracing::debug!("Updated record {} for {}", record_id, payload.name);
        Ok(())
    }

    /// Send one API request and decode its `result`
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&RecordPayload<'_>>,
    ) -> Result<T> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} {} failed: {}", method, url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response body: {}", e)))?;

        decode_response(status, &text)
    }
}

/// Validate an API response body and extract its `result`
fn decode_response<T: DeserializeOwned>(status: reqwest::StatusCode, body: &str) -> Result<T> {
    let envelope: ApiResponse = serde_json::from_str(body)
        .map_err(|e| Error::malformed(format!("HTTP {}: {}", status, e)))?;

    if !envelope.success {
        let message = envelope
            .errors
            .into_iter()
            .next()
            .map(|e| e.message)
            .ok_or_else(|| {
                Error::malformed(format!("HTTP {}: unsuccessful response without errors", status))
            })?;
        return Err(Error::provider(message));
    }

    serde_json::from_value(envelope.result)
        .map_err(|e| Error::malformed(format!("unexpected result shape: {}", e)))
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Make the record described by `target` exist with the desired content
    ///
    /// No retries: any failure is returned to the engine, which logs it and
    /// moves on to the next domain.
    async fn reconcile(&self, target: &ReconciliationTarget) -> Result<ReconcileOutcome> {
        let payload = RecordPayload::from(target);

        tracing::debug!(
            "Reconciling {} record {} -> {} (ttl {})",
            payload.record_type,
            payload.name,
            payload.content,
            payload.ttl
        );

        // Step 1: Zone
        let zone_id = self.get_zone_id(&target.domain_name).await?;

        // Step 2: Record
        let existing = self.get_record_id(&zone_id, &target.domain_name).await?;

        // Step 3: Create when missing, then always update
        let (record_id, created) = match existing {
            Some(record_id) => (record_id, false),
            None => (self.create_record(&zone_id, &payload).await?, true),
        };
        self.update_record(&zone_id, &record_id, &payload).await?;

        tracing::info!("DNS record in sync: {} -> {}", payload.name, payload.content);

        Ok(if created {
            ReconcileOutcome::Created { record_id }
        } else {
            ReconcileOutcome::Updated { record_id }
        })
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
