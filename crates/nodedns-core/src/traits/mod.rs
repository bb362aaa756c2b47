//! Core trait definitions
//!
//! These traits define the seams between the reconciliation core and its
//! collaborators: the DNS provider API, the downstream change consumer, the
//! cluster membership feed, and the metrics system.

pub mod change_sink;
pub mod dns_provider;
pub mod membership_feed;
pub mod metrics;

pub use change_sink::{ChangeSink, ProjectionChange};
pub use dns_provider::{DnsProvider, NewRecord, ProviderRecord, RecordKind, RecordPage};
pub use membership_feed::{MemberEvent, MembershipFeed};
pub use metrics::{MetricsSink, NoopMetrics};
