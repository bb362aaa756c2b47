// # nodedns-core
//
// Core library for the nodedns cluster-to-DNS reconciliation system.
//
// ## Architecture Overview
//
// This library keeps a DNS record in sync with the addresses of a dynamic
// cluster:
// - **Member / RawMember**: typed boundary for raw membership events and the
//   extraction of classified addresses from them
// - **Projection**: deduplicated, canonically ordered internal/external
//   address views derived from the membership table
// - **MemberRegistry**: concurrency-safe membership table that diffs the
//   projections around each mutation and notifies only on change
// - **Reconciler**: diffs a desired address set against the provider's
//   records and applies the minimal create/delete operations
// - **NodeDnsEngine**: wires a membership feed to the registry and registry
//   change notifications to DNS reconciliation
//
// ## Design Principles
//
// 1. **Single Writer**: one process owns the membership table and the zone
// 2. **Minimal Change**: no notification, and no provider call, without an
//    actual difference
// 3. **No Hidden Retries**: a failed reconciliation is retried by the next
//    membership event or periodic resync, never by an internal loop
// 4. **Library-First**: the daemon is a thin shell over these types

pub mod config;
pub mod engine;
pub mod error;
pub mod member;
pub mod projection;
pub mod reconciler;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, NodeDnsConfig, ProviderConfig, RecordTargets};
pub use engine::{DnsUpdateSink, NodeDnsEngine};
pub use error::{Error, Result};
pub use member::{Member, RawMember};
pub use projection::{Projection, ProjectionKind};
pub use reconciler::Reconciler;
pub use registry::MemberRegistry;
pub use traits::{ChangeSink, DnsProvider, MembershipFeed, MetricsSink, ProjectionChange};
