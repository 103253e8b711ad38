// # DigitalOcean DNS Provider
//
// This crate provides the DigitalOcean DNS provider for the updater.
//
// ## Behavior
//
// - One HTTP request per trait call (plus one per extra page when listing)
// - Full error propagation: no retry, no backoff
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401, 403, 404, 429, 5xx)
// - Dry-run mode: all GETs happen, record writes are only logged
//
// ## Trust Level: Untrusted (DNS Provider)
//
// The provider never decides which records to rewrite; the engine picks the
// apex A records and hands them to `update_record`.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider fails fast if the token is empty
//
// ## API Reference
//
// - DigitalOcean API v2: https://docs.digitalocean.com/reference/api/
// - Retrieve Domain: GET `/v2/domains/:name`
// - List Domain Records: GET `/v2/domains/:name/records?page=N&per_page=200`
// - Update Domain Record: PUT `/v2/domains/:name/records/:id`

use async_trait::async_trait;
use dodns_core::config::ProviderConfig;
use dodns_core::traits::{APEX_NAME, DnsProvider, DnsRecord, DomainInfo, RECORD_TYPE_A};
use dodns_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// DigitalOcean API base URL
pub const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest page size the records endpoint accepts
const RECORDS_PER_PAGE: u32 = 200;

const PROVIDER_NAME: &str = "digitalocean";

/// DigitalOcean DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (domain lookup, record listing)
/// - Log the intended PUT payload
/// - **NOT** modify DNS records
pub struct DigitalOceanProvider {
    /// API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for tests)
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for DigitalOceanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DigitalOceanProvider {
    /// Create a new DigitalOcean provider against the public API
    ///
    /// # Parameters
    ///
    /// - `api_token`: Personal access token with write scope on domains
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("DigitalOcean API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: DIGITALOCEAN_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let provider = Self::new(config.api_token.clone(), config.dry_run)?;
        if config.dry_run {
            tracing::warn!("DigitalOcean provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(match &config.api_base {
            Some(base) => provider.with_api_base(base.clone()),
            None => provider,
        })
    }

    /// Point the provider at another API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether record writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn domain_url(&self, domain: &str) -> String {
        format!("{}/v2/domains/{}", self.api_base, domain)
    }

    /// Send a request with auth headers and map transport failures
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::http(format!("DigitalOcean API request timed out: {}", e))
                } else {
                    Error::http(format!("DigitalOcean API request failed: {}", e))
                }
            })
    }

    /// Fetch one page of records
    async fn list_records_page(&self, domain: &str, page: u32) -> Result<RecordsPage> {
        let url = format!(
            "{}/records?page={}&per_page={}",
            self.domain_url(domain),
            page,
            RECORDS_PER_PAGE
        );

        let response = self.send(self.client.get(&url)).await?;
        let response = check_status(response, &format!("records of {}", domain)).await?;

        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e)))
    }
}

/// Turn a non-2xx response into the matching error
///
/// `what` names the resource for not-found messages ("domain example.com").
async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or(body);

    Err(match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {} - {}",
            status, message
        )),
        404 => Error::not_found(format!("{} ({})", what, message)),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("Server error (transient): {} - {}", status, message),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("Request for {} failed: {} - {}", what, status, message),
        ),
    })
}

#[async_trait]
impl DnsProvider for DigitalOceanProvider {
    async fn resolve_domain(&self, domain: &str) -> Result<DomainInfo> {
        tracing::debug!("Resolving domain {}", domain);

        let response = self.send(self.client.get(self.domain_url(domain))).await?;
        let response = check_status(response, &format!("domain {}", domain)).await?;

        let body: DomainResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e)))?;

        Ok(DomainInfo {
            name: body.domain.name,
            ttl: body.domain.ttl,
        })
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let body = self.list_records_page(domain, page).await?;
            let fetched = body.domain_records.len();
            records.extend(body.domain_records.into_iter().map(DnsRecord::from));

            let has_next = body
                .links
                .pages
                .and_then(|p| p.next)
                .is_some();
            if !has_next || fetched == 0 {
                break;
            }
            page += 1;
        }

        tracing::debug!("Listed {} record(s) for {} over {} page(s)", records.len(), domain, page);
        Ok(records)
    }

    async fn update_record(&self, domain: &str, record: &DnsRecord, data: &str) -> Result<()> {
        let url = format!("{}/records/{}", self.domain_url(domain), record.id);
        let payload = UpdateRecordRequest {
            record_type: RECORD_TYPE_A,
            name: APEX_NAME,
            data,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload).unwrap_or_default()
            );
            return Ok(());
        }

        tracing::debug!(
            "PUT {}: {} record {} of {}: {} -> {}",
            url,
            record.record_type,
            record.id,
            domain,
            record.data,
            data
        );

        let response = self.send(self.client.put(&url).json(&payload)).await?;
        check_status(response, &format!("record {} of {}", record.id, domain)).await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

// DigitalOcean API types

#[derive(Debug, Deserialize)]
struct DomainResponse {
    domain: DomainBody,
}

#[derive(Debug, Deserialize)]
struct DomainBody {
    name: String,
    #[serde(default)]
    ttl: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RecordsPage {
    domain_records: Vec<ApiRecord>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<Pages>,
}

#[derive(Debug, Deserialize)]
struct Pages {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: u64,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    #[serde(default)]
    data: String,
    #[serde(default)]
    ttl: Option<u32>,
}

impl From<ApiRecord> for DnsRecord {
    fn from(record: ApiRecord) -> Self {
        DnsRecord {
            id: record.id,
            record_type: record.record_type,
            name: record.name,
            data: record.data,
            ttl: record.ttl,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}
