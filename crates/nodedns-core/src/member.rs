//! Cluster members and address extraction
//!
//! A `RawMember` is the typed form of one membership event from the cluster
//! watch feed. [`Member::from_raw`] turns it into a [`Member`] carrying only
//! the classified IP addresses that may be exported to DNS. Extraction is
//! total: malformed input degrades to an empty-address member, it never
//! fails.

use std::net::IpAddr;
use tracing::debug;

/// Reported readiness of a member, as surfaced by the cluster.
///
/// Anything other than `True` keeps the member out of both projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    /// The member reports ready
    True,
    /// The member explicitly reports not ready
    False,
    /// The member's readiness could not be determined
    #[default]
    Unknown,
}

/// Classification of one reported address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Cluster-internal IP address
    Internal,
    /// Externally reachable IP address
    External,
    /// The member's host name
    Hostname,
    /// Cluster-internal DNS name
    InternalDns,
    /// External DNS name
    ExternalDns,
}

/// One (kind, address) pair as reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAddress {
    pub kind: AddressKind,
    pub address: String,
}

impl RawAddress {
    pub fn new(kind: AddressKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
        }
    }
}

/// A raw member description delivered by the membership feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawMember {
    /// Unique member name, the membership table key
    pub name: String,
    /// Whether the cluster has marked the member unschedulable
    pub unschedulable: bool,
    /// Reported readiness
    pub ready: ReadyState,
    /// All reported addresses, in report order
    pub addresses: Vec<RawAddress>,
}

/// A cluster member with its classified addresses.
///
/// Address lists may contain duplicates and carry no ordering guarantee;
/// deduplication and ordering happen when projections are built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Member {
    pub name: String,
    pub internal: Vec<IpAddr>,
    pub external: Vec<IpAddr>,
}

impl Member {
    /// Builds a `Member` from a raw description.
    ///
    /// An unschedulable or not-ready member yields empty address lists but
    /// keeps its name, so it still occupies its table key and a later
    /// eligible report is an update rather than an add. This mirrors the
    /// eligibility rules the cluster itself applies when picking members to
    /// serve traffic.
    pub fn from_raw(raw: &RawMember) -> Self {
        let mut member = Member {
            name: raw.name.clone(),
            ..Member::default()
        };

        if raw.unschedulable {
            debug!(member = %raw.name, "not considered for dns, marked unschedulable");
            return member;
        }
        if raw.ready != ReadyState::True {
            debug!(member = %raw.name, "not considered for dns, not ready");
            return member;
        }

        for addr in &raw.addresses {
            let parsed: IpAddr = match addr.address.parse() {
                Ok(ip) => ip,
                Err(_) => {
                    debug!(member = %raw.name, address = %addr.address, "dropping unparseable address");
                    continue;
                }
            };
            match addr.kind {
                AddressKind::Internal => member.internal.push(parsed),
                AddressKind::External => member.external.push(parsed),
                // Hostnames and DNS names could feed CNAME records; unused here.
                AddressKind::Hostname | AddressKind::InternalDns | AddressKind::ExternalDns => {}
            }
        }
        member
    }

    /// Whether this member exports at least one address.
    pub fn exports_addresses(&self) -> bool {
        !self.internal.is_empty() || !self.external.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn classifies_addresses_in_report_order() {
        let raw = RawMember {
            name: "host-1".to_string(),
            unschedulable: false,
            ready: ReadyState::True,
            addresses: vec![
                RawAddress::new(AddressKind::Hostname, "host-1"),
                RawAddress::new(AddressKind::ExternalDns, "host-1.example.com"),
                RawAddress::new(AddressKind::External, "42.0.0.1"),
                RawAddress::new(AddressKind::External, "42.0.0.2"),
                RawAddress::new(AddressKind::Internal, "10.0.0.1"),
            ],
        };

        let member = Member::from_raw(&raw);
        assert_eq!(member.name, "host-1");
        assert_eq!(member.external, vec![ip("42.0.0.1"), ip("42.0.0.2")]);
        assert_eq!(member.internal, vec![ip("10.0.0.1")]);
    }

    #[test]
    fn unschedulable_member_exports_nothing() {
        let raw = RawMember {
            name: "host-1".to_string(),
            unschedulable: true,
            ready: ReadyState::True,
            addresses: vec![RawAddress::new(AddressKind::External, "42.0.0.1")],
        };

        let member = Member::from_raw(&raw);
        assert_eq!(member.name, "host-1");
        assert!(!member.exports_addresses());
    }

    #[test]
    fn not_ready_and_unknown_members_export_nothing() {
        for ready in [ReadyState::False, ReadyState::Unknown] {
            let raw = RawMember {
                name: "host-1".to_string(),
                ready,
                addresses: vec![
                    RawAddress::new(AddressKind::Internal, "10.0.0.1"),
                    RawAddress::new(AddressKind::External, "42.0.0.1"),
                ],
                ..RawMember::default()
            };
            assert!(!Member::from_raw(&raw).exports_addresses());
        }
    }

    #[test]
    fn unparseable_addresses_are_dropped() {
        let raw = RawMember {
            name: "host-1".to_string(),
            ready: ReadyState::True,
            addresses: vec![
                RawAddress::new(AddressKind::External, "not-an-address"),
                RawAddress::new(AddressKind::External, "42.0.0.1"),
            ],
            ..RawMember::default()
        };

        let member = Member::from_raw(&raw);
        assert_eq!(member.external, vec![ip("42.0.0.1")]);
    }

    #[test]
    fn extraction_is_total_on_empty_input() {
        let member = Member::from_raw(&RawMember::default());
        assert_eq!(member.name, "");
        assert!(!member.exports_addresses());
    }
}
