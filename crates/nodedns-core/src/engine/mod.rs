//! Core nodedns engine
//!
//! The engine wires the collaborators together:
//!
//! ```text
//! ┌────────────────┐                    ┌────────────────┐
//! │ MembershipFeed │── MemberEvent ───▶ │ MemberRegistry │
//! └────────────────┘                    └────────────────┘
//!                                               │ changed projections
//!                                               ▼
//!                                       ┌────────────────┐
//!                                       │ DnsUpdateSink  │── Reconcile ──▶ provider
//!                                       └────────────────┘
//! ```
//!
//! Feed events map 1:1 onto registry operations. A periodic ticker calls
//! [`MemberRegistry::resync`] so that DNS converges even when a change
//! notification was lost or a reconciliation pass failed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

use crate::config::RecordTargets;
use crate::error::Result;
use crate::reconciler::Reconciler;
use crate::registry::MemberRegistry;
use crate::traits::{ChangeSink, MemberEvent, MembershipFeed, ProjectionChange};

/// Change sink that publishes each changed projection to its configured
/// DNS record name.
///
/// An empty record name disables that side. Reconciliation errors are
/// logged, never propagated: the next membership event or periodic resync
/// retries convergence.
pub struct DnsUpdateSink {
    reconciler: Reconciler,
    records: RecordTargets,
}

impl DnsUpdateSink {
    pub fn new(reconciler: Reconciler, records: RecordTargets) -> Self {
        Self {
            reconciler,
            records,
        }
    }
}

#[async_trait]
impl ChangeSink for DnsUpdateSink {
    async fn notify(&self, change: ProjectionChange) {
        let kind = change.projection.kind;
        info!(
            kind = kind.as_str(),
            addresses = ?change.projection.addresses,
            "current addresses"
        );

        let record = self.records.for_kind(kind);
        if record.is_empty() {
            debug!(kind = kind.as_str(), "no record configured, skipping");
            return;
        }

        if let Err(err) = self
            .reconciler
            .reconcile(change.deadline, record, &change.projection.addresses)
            .await
        {
            error!(record, error = %err, "problem updating dns");
        }
    }
}

/// Core nodedns engine
///
/// Drives the membership feed into the registry and re-asserts current
/// state on a fixed interval. Runs until the feed ends or a shutdown signal
/// arrives.
pub struct NodeDnsEngine {
    feed: Box<dyn MembershipFeed>,
    registry: Arc<MemberRegistry>,
    resync_interval: Option<Duration>,
}

impl NodeDnsEngine {
    pub fn new(
        feed: Box<dyn MembershipFeed>,
        registry: Arc<MemberRegistry>,
        resync_interval: Option<Duration>,
    ) -> Self {
        Self {
            feed,
            registry,
            resync_interval,
        }
    }

    /// Run the engine until the feed ends or SIGINT arrives.
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Test-only entry point with a controlled shutdown signal.
    ///
    /// Contract tests need deterministic shutdown; production code should
    /// use [`run`](NodeDnsEngine::run), which terminates on OS signals.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        let mut events = self.feed.watch();

        // The first tick fires one full interval after startup; the feed's
        // initial replace event covers time zero.
        let mut resync = self.resync_interval.map(|interval| {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker
        });

        if let Some(mut rx) = shutdown_rx {
            loop {
                tokio::select! {
                    maybe_event = events.next() => match maybe_event {
                        Some(event) => self.apply(event).await,
                        None => {
                            info!("membership feed ended");
                            break;
                        }
                    },
                    _ = tick(&mut resync) => {
                        debug!("periodic resync");
                        self.registry.resync().await;
                    }
                    _ = &mut rx => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        } else {
            loop {
                tokio::select! {
                    maybe_event = events.next() => match maybe_event {
                        Some(event) => self.apply(event).await,
                        None => {
                            info!("membership feed ended");
                            break;
                        }
                    },
                    _ = tick(&mut resync) => {
                        debug!("periodic resync");
                        self.registry.resync().await;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    async fn apply(&self, event: MemberEvent) {
        match event {
            MemberEvent::Add(raw) => self.registry.add(&raw).await,
            MemberEvent::Update(raw) => self.registry.update(&raw).await,
            MemberEvent::Delete(raw) => self.registry.delete(&raw).await,
            MemberEvent::Replace(raws) => self.registry.replace(&raws).await,
        }
    }
}

/// Awaits the next resync tick, or forever when the ticker is disabled.
async fn tick(resync: &mut Option<tokio::time::Interval>) {
    match resync {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
