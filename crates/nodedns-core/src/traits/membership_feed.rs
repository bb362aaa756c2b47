// # Membership Feed Trait
//
// Defines the interface for the cluster watch collaborator that delivers
// raw membership events. The real implementation wraps a cluster API
// watch/list primitive; tests drive a channel-backed feed.

use std::pin::Pin;
use tokio_stream::Stream;

use crate::member::RawMember;

/// One membership event from the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberEvent {
    /// A member appeared
    Add(RawMember),
    /// A member's description changed
    Update(RawMember),
    /// A member went away
    Delete(RawMember),
    /// Full resynchronization against ground truth: the complete current
    /// member list, replacing everything known so far
    Replace(Vec<RawMember>),
}

/// Trait for membership feed implementations
///
/// The stream runs until the cluster connection is torn down; dropping it
/// must release the watch resources.
pub trait MembershipFeed: Send + Sync {
    /// Returns the stream of membership events.
    fn watch(&self) -> Pin<Box<dyn Stream<Item = MemberEvent> + Send + 'static>>;
}
