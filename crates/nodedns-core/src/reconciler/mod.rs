//! DNS reconciliation
//!
//! One [`Reconciler::reconcile`] call converges a single record name onto a
//! desired address set: fetch every page of the provider's existing address
//! records, diff against the desired set by canonical address, create what
//! is missing and delete what is stale. Addresses present on both sides are
//! left untouched; there is no update-in-place, a changed address is a
//! delete plus a create.
//!
//! The first create/delete failure aborts the pass and is returned to the
//! caller. Nothing is rolled back: re-running the whole pass converges to
//! the same desired state, so recovery is simply the next membership event
//! or periodic resync.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::projection::canonical;
use crate::traits::{DnsProvider, MetricsSink, NewRecord, NoopMetrics, RecordKind};

/// Hard ceiling on record-list pagination, guarding against a provider that
/// never reports a last page.
pub const MAX_RECORD_PAGES: u32 = 100;

/// Converges DNS record names in one zone onto desired address sets.
pub struct Reconciler {
    provider: Arc<dyn DnsProvider>,
    zone: String,
    ttl: Duration,
    /// Compute and log intended changes without applying them.
    dry_run: bool,
    metrics: Arc<dyn MetricsSink>,
}

impl Reconciler {
    pub fn new(provider: Arc<dyn DnsProvider>, zone: impl Into<String>, ttl: Duration) -> Self {
        Self {
            provider,
            zone: zone.into(),
            ttl,
            dry_run: false,
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Make the provider's records for `record_name` match `desired`.
    ///
    /// A no-op (success) when `record_name` is empty. All provider calls
    /// respect `deadline`; expiry surfaces [`Error::Cancelled`] rather than
    /// a provider error.
    pub async fn reconcile(
        &self,
        deadline: Instant,
        record_name: &str,
        desired: &[IpAddr],
    ) -> Result<()> {
        if record_name.is_empty() {
            return Ok(());
        }
        self.metrics.update_attempt(&self.zone, record_name);

        let existing = self.fetch_records(deadline, record_name).await?;
        let diff = diff_records(desired, &existing);
        if !diff.is_empty() {
            debug!(
                zone = %self.zone,
                record = record_name,
                to_create = ?diff.create,
                to_delete = ?diff.delete_addresses,
                "dns changes needed"
            );
        }

        if self.dry_run {
            info!(
                zone = %self.zone,
                record = record_name,
                creates = diff.create.len(),
                deletes = diff.delete.len(),
                "dry run enabled, discarding intended changes"
            );
            return Ok(());
        }

        for &ip in &diff.create {
            let kind = RecordKind::for_ip(ip);
            let new = NewRecord {
                name: record_name.to_string(),
                kind,
                data: ip.to_string(),
                ttl_secs: self.ttl.as_secs() as u32,
            };
            with_deadline(deadline, self.provider.create_record(&self.zone, &new))
                .await
                .map_err(|err| match err {
                    Error::Cancelled => Error::Cancelled,
                    other => Error::RecordCreate {
                        kind: kind.as_str(),
                        address: ip.to_string(),
                        message: other.to_string(),
                    },
                })?;
            self.metrics.record_created(&self.zone, record_name);
            debug!(zone = %self.zone, record = record_name, address = %ip, "created record");
        }

        for &id in &diff.delete {
            with_deadline(deadline, self.provider.delete_record(&self.zone, id))
                .await
                .map_err(|err| match err {
                    Error::Cancelled => Error::Cancelled,
                    other => Error::RecordDelete {
                        id,
                        message: other.to_string(),
                    },
                })?;
            self.metrics.record_deleted(&self.zone, record_name);
            debug!(zone = %self.zone, record = record_name, id, "deleted record");
        }

        self.metrics.update_ok(&self.zone, record_name);
        Ok(())
    }

    /// Fetch every page of existing A/AAAA records matching `record_name`,
    /// building the address-string → record-id map. Always re-fetched, never
    /// cached across calls.
    async fn fetch_records(
        &self,
        deadline: Instant,
        record_name: &str,
    ) -> Result<HashMap<String, u64>> {
        let mut result = HashMap::new();
        for page in 0..MAX_RECORD_PAGES {
            let fetched = with_deadline(deadline, self.provider.list_records(&self.zone, page))
                .await
                .map_err(|err| match err {
                    Error::Cancelled => Error::Cancelled,
                    other => Error::ProviderFetch {
                        record_name: record_name.to_string(),
                        page,
                        message: other.to_string(),
                    },
                })?;
            for rec in fetched.records {
                if (rec.kind == "A" || rec.kind == "AAAA") && rec.name == record_name {
                    // When the provider holds duplicate records for one
                    // address, the last id wins and the other record is
                    // orphaned until its address leaves the desired set.
                    result.insert(rec.data, rec.id);
                }
            }
            if fetched.is_last_page {
                return Ok(result);
            }
        }
        Err(Error::TooManyPages {
            record_name: record_name.to_string(),
            limit: MAX_RECORD_PAGES,
        })
    }
}

/// Runs one provider call under the pass's deadline. Expiry drops the
/// in-flight call and surfaces [`Error::Cancelled`].
async fn with_deadline<T>(
    deadline: Instant,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Cancelled),
    }
}

/// The operations needed to converge a record set: ids to delete, addresses
/// to create, and the stale addresses (for logging).
#[derive(Debug, Default, PartialEq, Eq)]
struct RecordDiff {
    create: Vec<IpAddr>,
    delete: Vec<u64>,
    delete_addresses: Vec<String>,
}

impl RecordDiff {
    fn is_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}

/// Diffs the desired addresses against the existing address→id map.
///
/// Comparison is by canonical address form, so an existing record whose
/// textual representation differs from the desired address still counts as
/// present. An address on both sides produces neither a create nor a
/// delete.
fn diff_records(desired: &[IpAddr], existing: &HashMap<String, u64>) -> RecordDiff {
    let desired_keys: HashSet<String> = desired
        .iter()
        .map(|&ip| canonical(ip).to_string())
        .collect();

    let mut diff = RecordDiff::default();
    let mut existing_keys = HashSet::new();
    for (address, &id) in existing {
        let key = canonical_key(address);
        existing_keys.insert(key.clone());
        if !desired_keys.contains(&key) {
            diff.delete.push(id);
            diff.delete_addresses.push(address.clone());
        }
    }

    let mut queued = HashSet::new();
    for &ip in desired {
        let key = canonical(ip).to_string();
        if !existing_keys.contains(&key) && queued.insert(key) {
            diff.create.push(canonical(ip));
        }
    }
    diff
}

/// Canonical comparison key for a provider-reported address string. A
/// string that does not parse as an address keeps its raw form and so never
/// matches a desired address.
fn canonical_key(address: &str) -> String {
    address
        .parse::<IpAddr>()
        .map(|ip| canonical(ip).to_string())
        .unwrap_or_else(|_| address.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn existing(entries: &[(&str, u64)]) -> HashMap<String, u64> {
        entries
            .iter()
            .map(|(addr, id)| (addr.to_string(), *id))
            .collect()
    }

    #[test]
    fn diff_table() {
        struct Case {
            existing: HashMap<String, u64>,
            desired: Vec<IpAddr>,
            want_delete: Vec<u64>,
            want_create: Vec<IpAddr>,
        }
        let cases = [
            Case {
                existing: existing(&[]),
                desired: vec![],
                want_delete: vec![],
                want_create: vec![],
            },
            Case {
                existing: existing(&[]),
                desired: vec![ip("1.2.3.4"), ip("1.2.3.5")],
                want_delete: vec![],
                want_create: vec![ip("1.2.3.4"), ip("1.2.3.5")],
            },
            Case {
                existing: existing(&[("1.2.3.4", 1234)]),
                desired: vec![],
                want_delete: vec![1234],
                want_create: vec![],
            },
            Case {
                existing: existing(&[("1.2.3.4", 1234)]),
                desired: vec![ip("1.2.3.4")],
                want_delete: vec![],
                want_create: vec![],
            },
            Case {
                existing: existing(&[("1.2.3.4", 1234)]),
                desired: vec![ip("1.2.3.5")],
                want_delete: vec![1234],
                want_create: vec![ip("1.2.3.5")],
            },
            Case {
                existing: existing(&[("1.2.3.4", 1234), ("1.2.3.5", 1235)]),
                desired: vec![ip("1.2.3.5"), ip("1.2.3.6")],
                want_delete: vec![1234],
                want_create: vec![ip("1.2.3.6")],
            },
            // Representation-independent equality: an IPv4-mapped IPv6
            // desired address matches a plain IPv4 record.
            Case {
                existing: existing(&[("1.2.3.4", 1234)]),
                desired: vec![ip("::ffff:1.2.3.4")],
                want_delete: vec![],
                want_create: vec![],
            },
        ];

        for (i, case) in cases.iter().enumerate() {
            let mut diff = diff_records(&case.desired, &case.existing);
            diff.delete.sort_unstable();
            assert_eq!(diff.delete, case.want_delete, "case {i}: to delete");
            assert_eq!(diff.create, case.want_create, "case {i}: to create");
        }
    }

    #[test]
    fn diff_never_creates_and_deletes_one_address() {
        let diff = diff_records(
            &[ip("1.2.3.4"), ip("::ffff:1.2.3.4")],
            &existing(&[("::ffff:1.2.3.4", 7)]),
        );
        assert!(diff.is_empty());
    }

    #[test]
    fn unparseable_existing_data_becomes_stale() {
        let diff = diff_records(&[ip("1.2.3.4")], &existing(&[("garbage", 9)]));
        assert_eq!(diff.delete, vec![9]);
        assert_eq!(diff.create, vec![ip("1.2.3.4")]);
        assert_eq!(diff.delete_addresses, vec!["garbage".to_string()]);
    }
}
