// # Metrics Sink Trait
//
// Operational counters and gauges are reported through an explicit sink
// passed in at construction rather than process-wide globals. The default
// method bodies make every hook optional, so implementations only bridge
// the measurements they care about.

/// Sink for operational counters and gauges.
pub trait MetricsSink: Send + Sync {
    /// A registry operation ran (`op` is "add", "update", "delete",
    /// "replace" or "resync").
    fn member_event(&self, _store: &str, _op: &str) {}

    /// Gauge update after a mutation: total tracked members and how many of
    /// them currently export at least one address.
    fn member_counts(&self, _store: &str, _total: usize, _exported: usize) {}

    /// A change notification was abandoned at its deadline.
    fn notification_timeout(&self, _store: &str, _op: &str) {}

    /// A reconciliation pass started.
    fn update_attempt(&self, _zone: &str, _record: &str) {}

    /// A reconciliation pass completed successfully.
    fn update_ok(&self, _zone: &str, _record: &str) {}

    /// An address record was created.
    fn record_created(&self, _zone: &str, _record: &str) {}

    /// An address record was deleted.
    fn record_deleted(&self, _zone: &str, _record: &str) {}
}

/// Discards every measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {}
