//! Concurrency-safe member registry with change detection
//!
//! The registry owns the membership table. Every mutation snapshots both
//! projections before and after the change while holding the table's
//! exclusive lock, then releases the lock and notifies the change sink for
//! each projection that actually changed. The lock is held only for the
//! mutate-and-diff phase, so a slow consumer stalls the operation that
//! produced the change but never other concurrent operations.
//!
//! Registry operations are infallible: malformed input degrades to an
//! empty-address member, and a notification that misses its deadline is
//! logged and abandoned while the table mutation stands. Periodic
//! [`MemberRegistry::resync`] re-asserts current state to recover from any
//! lost notification.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::error;

use crate::member::{Member, RawMember};
use crate::projection::{Projection, ProjectionKind};
use crate::traits::{ChangeSink, MetricsSink, NoopMetrics, ProjectionChange};

/// Worst-case time one notification may block its issuing operation.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Stateful store of cluster members and the single writer of the
/// membership table.
pub struct MemberRegistry {
    /// Registry name, for logging and metrics
    name: String,
    /// Per-notification delivery deadline
    timeout: Duration,
    sink: Arc<dyn ChangeSink>,
    metrics: Arc<dyn MetricsSink>,
    /// The membership table. Never read without the lock, never exposed by
    /// reference; projections are computed and copied out under the lock.
    members: Mutex<HashMap<String, Member>>,
}

impl MemberRegistry {
    pub fn new(name: impl Into<String>, sink: Arc<dyn ChangeSink>) -> Self {
        Self {
            name: name.into(),
            timeout: DEFAULT_NOTIFY_TIMEOUT,
            sink,
            metrics: Arc::new(NoopMetrics),
            members: Mutex::new(HashMap::new()),
        }
    }

    /// Set the per-notification delivery timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Insert or overwrite one member.
    pub async fn add(&self, raw: &RawMember) {
        let member = Member::from_raw(raw);
        let changes = self.mutate("add", move |members| {
            members.insert(member.name.clone(), member);
        });
        self.dispatch("add", changes).await;
    }

    /// Overwrite one member. Upsert semantics are identical to [`add`];
    /// the operations are kept separate so event counters tell them apart.
    ///
    /// [`add`]: MemberRegistry::add
    pub async fn update(&self, raw: &RawMember) {
        let member = Member::from_raw(raw);
        let changes = self.mutate("update", move |members| {
            members.insert(member.name.clone(), member);
        });
        self.dispatch("update", changes).await;
    }

    /// Remove one member. Only the identity of `raw` matters; its addresses
    /// are irrelevant.
    pub async fn delete(&self, raw: &RawMember) {
        let name = raw.name.clone();
        let changes = self.mutate("delete", move |members| {
            members.remove(&name);
        });
        self.dispatch("delete", changes).await;
    }

    /// Atomically swap the whole table for one rebuilt from `raws`. Used
    /// for full resynchronization against ground truth.
    pub async fn replace(&self, raws: &[RawMember]) {
        let rebuilt: HashMap<String, Member> = raws
            .iter()
            .map(Member::from_raw)
            .map(|m| (m.name.clone(), m))
            .collect();
        let changes = self.mutate("replace", move |members| {
            *members = rebuilt;
        });
        self.dispatch("replace", changes).await;
    }

    /// Unconditionally notify the current External then Internal
    /// projections, whether or not anything changed since the last
    /// notification. Guards against notification loss: a dropped or
    /// unacted-on notify is repaired by the next resync.
    pub async fn resync(&self) {
        self.metrics.member_event(&self.name, "resync");
        let changes = {
            let members = self.members.lock().unwrap();
            vec![
                Projection::build(&members, ProjectionKind::External),
                Projection::build(&members, ProjectionKind::Internal),
            ]
        };
        self.dispatch("resync", changes).await;
    }

    /// Runs `f` on the table under the lock, diffing both projections
    /// around it. Returns the changed projections, External first.
    fn mutate(
        &self,
        op: &str,
        f: impl FnOnce(&mut HashMap<String, Member>),
    ) -> Vec<Projection> {
        self.metrics.member_event(&self.name, op);
        let mut members = self.members.lock().unwrap();

        let before_external = Projection::build(&members, ProjectionKind::External);
        let before_internal = Projection::build(&members, ProjectionKind::Internal);

        f(&mut members);

        let exported = members.values().filter(|m| m.exports_addresses()).count();
        self.metrics
            .member_counts(&self.name, members.len(), exported);

        let after_external = Projection::build(&members, ProjectionKind::External);
        let after_internal = Projection::build(&members, ProjectionKind::Internal);
        drop(members);

        let mut changed = Vec::new();
        if after_external != before_external {
            changed.push(after_external);
        }
        if after_internal != before_internal {
            changed.push(after_internal);
        }
        changed
    }

    /// Delivers changes to the sink, strictly after the lock is released.
    /// Each change gets a fresh deadline; an attempt that misses it is
    /// abandoned, not retried.
    async fn dispatch(&self, op: &str, changes: Vec<Projection>) {
        for projection in changes {
            let kind = projection.kind;
            let deadline = Instant::now() + self.timeout;
            let change = ProjectionChange {
                deadline,
                projection,
            };
            if timeout_at(deadline, self.sink.notify(change)).await.is_err() {
                self.metrics.notification_timeout(&self.name, op);
                error!(
                    store = %self.name,
                    op,
                    kind = kind.as_str(),
                    "change notification timed out"
                );
            }
        }
    }

    /// Number of members currently tracked (including ones exporting no
    /// addresses).
    pub fn len(&self) -> usize {
        self.members.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.lock().unwrap().is_empty()
    }

    /// Sorted copy of the tracked member names.
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}
