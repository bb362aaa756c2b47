// # Change Sink Trait
//
// Defines the interface for delivering changed projections to the downstream
// consumer (normally DNS reconciliation).
//
// ## Delivery contract
//
// - Called once per changed (or force-resynced) projection, outside the
//   registry's lock, so a slow consumer never blocks other registry
//   operations.
// - Each call carries a fresh deadline; the registry abandons the call once
//   the deadline passes and logs the loss. Delivery is therefore not
//   at-least-once; periodic resync is the recovery mechanism.
// - The issuing registry operation does not return until all of its
//   notifications have been attempted, so a slow consumer throttles the
//   call site (accepted: the membership feed queues behind DNS latency).

use async_trait::async_trait;
use tokio::time::Instant;

use crate::projection::Projection;

/// A changed projection plus the delivery deadline the issuing operation is
/// willing to wait for. Ephemeral: does not outlive one delivery attempt.
#[derive(Debug, Clone)]
pub struct ProjectionChange {
    /// Deadline for both delivery and any downstream provider calls.
    pub deadline: Instant,
    /// The full new projection (not a delta).
    pub projection: Projection,
}

/// Trait for consumers of projection changes
///
/// Implementations must be thread-safe. Both direct callbacks and channel
/// handoffs satisfy the contract, as long as `notify` returning means the
/// change was accepted.
#[async_trait]
pub trait ChangeSink: Send + Sync {
    /// Accepts one changed projection.
    async fn notify(&self, change: ProjectionChange);
}
