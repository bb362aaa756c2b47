//! Address projections derived from the membership table
//!
//! A projection is the deduplicated, canonically ordered view of one address
//! class (internal or external) across every member in the table. Projections
//! are recomputed on demand and compared structurally; because the address
//! list is already deduplicated and sorted, equality is exact-content
//! comparison.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::member::Member;

/// Which address class a projection is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    External,
    Internal,
}

impl ProjectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionKind::External => "external",
            ProjectionKind::Internal => "internal",
        }
    }
}

/// Canonical form of an address, used for deduplication and ordering.
///
/// IPv4-mapped IPv6 addresses collapse to their IPv4 form, so alternate
/// representations of one host compare equal.
pub fn canonical(ip: IpAddr) -> IpAddr {
    ip.to_canonical()
}

/// A deduplicated, canonically ordered address view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub kind: ProjectionKind,
    /// One canonical representative per address, sorted by canonical string
    /// form.
    pub addresses: Vec<IpAddr>,
}

impl Projection {
    /// Computes the projection of `kind` over the whole table.
    ///
    /// Deterministic for identical table contents regardless of map
    /// iteration order: addresses pass through a `BTreeMap` keyed by their
    /// canonical string form, and the canonical address itself is exported.
    pub fn build(members: &HashMap<String, Member>, kind: ProjectionKind) -> Self {
        let mut dedup = BTreeMap::new();
        for member in members.values() {
            let addresses = match kind {
                ProjectionKind::External => &member.external,
                ProjectionKind::Internal => &member.internal,
            };
            for &ip in addresses {
                let canon = canonical(ip);
                dedup.insert(canon.to_string(), canon);
            }
        }
        Projection {
            kind,
            addresses: dedup.into_values().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::{AddressKind, RawAddress, RawMember, ReadyState};

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn member(name: &str, internal: &[&str], external: &[&str]) -> Member {
        let raw = RawMember {
            name: name.to_string(),
            ready: ReadyState::True,
            addresses: internal
                .iter()
                .map(|a| RawAddress::new(AddressKind::Internal, *a))
                .chain(
                    external
                        .iter()
                        .map(|a| RawAddress::new(AddressKind::External, *a)),
                )
                .collect(),
            ..RawMember::default()
        };
        Member::from_raw(&raw)
    }

    fn table(members: Vec<Member>) -> HashMap<String, Member> {
        members.into_iter().map(|m| (m.name.clone(), m)).collect()
    }

    #[test]
    fn deduplicates_and_sorts_by_canonical_string() {
        let t = table(vec![
            member("host-1", &[], &["42.0.0.9", "42.0.0.10"]),
            member("host-2", &[], &["42.0.0.10", "42.0.0.2"]),
        ]);

        let p = Projection::build(&t, ProjectionKind::External);
        // Lexicographic order of the canonical strings, not numeric order.
        assert_eq!(
            p.addresses,
            vec![ip("42.0.0.10"), ip("42.0.0.2"), ip("42.0.0.9")]
        );
    }

    #[test]
    fn alternate_representations_collapse() {
        let t = table(vec![
            member("host-1", &[], &["1.2.3.4"]),
            member("host-2", &[], &["::ffff:1.2.3.4"]),
        ]);

        let p = Projection::build(&t, ProjectionKind::External);
        assert_eq!(p.addresses, vec![ip("1.2.3.4")]);
    }

    #[test]
    fn deterministic_across_insertion_order() {
        let members = vec![
            member("host-1", &["10.0.0.1"], &["42.0.0.1"]),
            member("host-2", &["10.0.0.2"], &["::ffff:42.0.0.1"]),
            member("host-3", &["10.0.0.2", "fd00::1"], &[]),
        ];

        let forward = table(members.clone());
        let reverse = table(members.into_iter().rev().collect());

        for kind in [ProjectionKind::External, ProjectionKind::Internal] {
            assert_eq!(
                Projection::build(&forward, kind),
                Projection::build(&reverse, kind)
            );
        }
    }

    #[test]
    fn kinds_do_not_leak_into_each_other() {
        let t = table(vec![member("host-1", &["10.0.0.1"], &["42.0.0.1"])]);

        assert_eq!(
            Projection::build(&t, ProjectionKind::Internal).addresses,
            vec![ip("10.0.0.1")]
        );
        assert_eq!(
            Projection::build(&t, ProjectionKind::External).addresses,
            vec![ip("42.0.0.1")]
        );
    }

    #[test]
    fn empty_table_gives_empty_projection() {
        let p = Projection::build(&HashMap::new(), ProjectionKind::External);
        assert!(p.is_empty());
    }
}
