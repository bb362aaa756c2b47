// # DNS Provider Trait
//
// Defines the interface for reading and mutating address records via a
// provider API.
//
// ## Implementations
//
// - DigitalOcean: `nodedns-provider-digitalocean` crate
// - Future: Cloudflare, Route53, etc.
//
// ## Provider rules
//
// Providers are stateless single-shot API callers:
//
// - ✅ Perform HTTP/HTTPS calls to their endpoints only
// - ✅ Parse provider-specific responses
// - ❌ No retry or backoff logic (convergence is driven by the next
//   membership event or periodic resync)
// - ❌ No caching across calls (the reconciler always re-fetches existing
//   records to avoid staleness)
// - ❌ No task spawning, no scheduling decisions
//
// Record updates have no update-in-place operation: a changed address is a
// delete of the old record plus a create of the new one, computed by the
// reconciler.

use async_trait::async_trait;
use std::net::IpAddr;

use crate::error::Result;

/// DNS record type for address records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
}

impl RecordKind {
    /// The record type matching an address's byte width.
    pub fn for_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordKind::A,
            IpAddr::V6(_) => RecordKind::Aaaa,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
        }
    }
}

/// One record as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    /// Provider-assigned record id
    pub id: u64,
    /// Record type as reported ("A", "AAAA", "CNAME", ...)
    pub kind: String,
    /// Record name as reported
    pub name: String,
    /// Record data (the address string for A/AAAA records)
    pub data: String,
}

/// One page of provider records.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<ProviderRecord>,
    /// Whether the provider marked this page as the last one. The reconciler
    /// stops iterating when this is set.
    pub is_last_page: bool,
}

/// A record to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub name: String,
    pub kind: RecordKind,
    /// The address string
    pub data: String,
    /// Time-to-live in seconds
    pub ttl_secs: u32,
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks. All
/// methods are single API calls; errors are returned to the reconciler,
/// which fails the current pass fast and leaves retrying to the caller's
/// natural cadence.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List one page of records in `zone`.
    ///
    /// Pages are zero-based from the reconciler's point of view;
    /// implementations translate to their API's numbering. The returned
    /// page must set `is_last_page` according to the provider's pagination
    /// markers.
    async fn list_records(&self, zone: &str, page: u32) -> Result<RecordPage>;

    /// Create an address record and return its provider-assigned id.
    async fn create_record(&self, zone: &str, new: &NewRecord) -> Result<u64>;

    /// Delete a record by id.
    async fn delete_record(&self, zone: &str, id: u64) -> Result<()>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
