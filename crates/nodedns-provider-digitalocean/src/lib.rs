// # DigitalOcean DNS Provider
//
// This crate provides a DigitalOcean DNS provider implementation for the
// nodedns system.
//
// The provider is a stateless single-shot API caller:
//
// - ✅ One HTTP request per trait method call
// - ✅ Full error propagation to the reconciler (which fails the current
//   pass fast; convergence is retried by the next event or resync)
// - ✅ HTTP timeout configured (30 seconds)
// - ❌ NO retry or backoff logic
// - ❌ NO caching across calls
// - ❌ NO background tasks
//
// ## Security
//
// - The API token NEVER appears in logs or `Debug` output
//
// ## API Reference
//
// - DigitalOcean API v2: https://docs.digitalocean.com/reference/api/
// - List records: GET `/v2/domains/{zone}/records?page=N&per_page=100`
// - Create record: POST `/v2/domains/{zone}/records`
// - Delete record: DELETE `/v2/domains/{zone}/records/{id}`

use async_trait::async_trait;
use nodedns_core::traits::{DnsProvider, NewRecord, ProviderRecord, RecordPage};
use nodedns_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// DigitalOcean API base URL
const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per page (the API maximum)
const RECORDS_PER_PAGE: u32 = 100;

/// DigitalOcean DNS provider
pub struct DigitalOceanProvider {
    /// Personal access token. Never logged.
    api_token: String,

    /// API base URL, overridable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// The Debug implementation intentionally does NOT expose the API token.
impl std::fmt::Debug for DigitalOceanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DigitalOceanProvider {
    /// Create a new DigitalOcean provider.
    ///
    /// # Parameters
    ///
    /// - `api_token`: personal access token with write access to the zone
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("DigitalOcean API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(e.to_string()))?;

        Ok(Self {
            api_token,
            base_url: DIGITALOCEAN_API_BASE.to_string(),
            client,
        })
    }

    /// Override the API base URL (for test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn records_url(&self, zone: &str) -> String {
        format!("{}/v2/domains/{}/records", self.base_url, zone)
    }
}

#[async_trait]
impl DnsProvider for DigitalOceanProvider {
    async fn list_records(&self, zone: &str, page: u32) -> Result<RecordPage> {
        // DigitalOcean pages are 1-based; the reconciler counts from 0.
        let response = self
            .client
            .get(self.records_url(zone))
            .query(&[("page", page + 1), ("per_page", RECORDS_PER_PAGE)])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        let response = check_status(response).await?;

        let body: RecordsResponse = response
            .json()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        let is_last_page = body.is_last_page();

        debug!(
            zone,
            page,
            records = body.domain_records.len(),
            is_last_page,
            "listed records"
        );
        Ok(RecordPage {
            records: body
                .domain_records
                .into_iter()
                .map(|r| ProviderRecord {
                    id: r.id,
                    kind: r.kind,
                    name: r.name,
                    data: r.data,
                })
                .collect(),
            is_last_page,
        })
    }

    async fn create_record(&self, zone: &str, new: &NewRecord) -> Result<u64> {
        let request = CreateRequest {
            kind: new.kind.as_str(),
            name: &new.name,
            data: &new.data,
            ttl: new.ttl_secs,
        };
        let response = self
            .client
            .post(self.records_url(zone))
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        let response = check_status(response).await?;

        let body: CreateResponse = response
            .json()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        debug!(zone, name = %new.name, data = %new.data, id = body.domain_record.id, "created record");
        Ok(body.domain_record.id)
    }

    async fn delete_record(&self, zone: &str, id: u64) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.records_url(zone), id))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        check_status(response).await?;
        debug!(zone, id, "deleted record");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "digitalocean"
    }
}

/// Maps a non-success response to an HTTP error carrying status and body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::http(format!("{status}: {body}")))
}

// Wire types, per API v2.

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    domain_records: Vec<DomainRecord>,
    #[serde(default)]
    links: Links,
}

impl RecordsResponse {
    /// The API omits `links.pages` entirely, or its `next` URL, on the last
    /// page.
    fn is_last_page(&self) -> bool {
        self.links
            .pages
            .as_ref()
            .is_none_or(|pages| pages.next.is_none())
    }
}

#[derive(Debug, Deserialize)]
struct DomainRecord {
    id: u64,
    #[serde(rename = "type")]
    kind: String,
    name: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<Pages>,
}

#[derive(Debug, Default, Deserialize)]
struct Pages {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
    data: &'a str,
    ttl: u32,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    domain_record: CreatedRecord,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: u64,
}
