//! Push replication metrics
//!
//! Counters only increase; the pass-duration gauge holds the most recent
//! pass. An external exporter reads them through `snapshot()` or
//! `to_json()`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all push replication instrumentation
///
/// # Thread Safety
///
/// Workers update counters concurrently. Relaxed ordering is enough: values
/// are read only for reporting.
#[derive(Debug, Default)]
pub struct ReplicationMetrics {
    /// Duration of the most recent pass, in nanoseconds (gauge)
    pass_nanoseconds: AtomicU64,
    /// Bulk-set messages handed to the transport
    out_bulk_set_pushes: AtomicU64,
    /// Entries carried by those messages
    out_bulk_set_push_values: AtomicU64,
    /// Passes run to completion
    passes_completed: AtomicU64,
    /// Passes cut short by a notification
    passes_preempted: AtomicU64,
    /// Partitions or worker sweeps abandoned because the ring moved
    ring_version_abandons: AtomicU64,
}

impl ReplicationMetrics {
    /// Create a new registry with all values at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the duration of the pass that just ended
    pub fn set_pass_nanoseconds(&self, nanos: u64) {
        self.pass_nanoseconds.store(nanos, Ordering::Relaxed);
    }

    /// Record one outgoing message carrying `entries` entries
    pub fn record_push(&self, entries: u64) {
        self.out_bulk_set_pushes.fetch_add(1, Ordering::Relaxed);
        self.out_bulk_set_push_values.fetch_add(entries, Ordering::Relaxed);
    }

    pub fn increment_passes_completed(&self) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_passes_preempted(&self) {
        self.passes_preempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_ring_version_abandons(&self) {
        self.ring_version_abandons.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pass_nanoseconds: self.pass_nanoseconds.load(Ordering::Relaxed),
            out_bulk_set_pushes: self.out_bulk_set_pushes.load(Ordering::Relaxed),
            out_bulk_set_push_values: self.out_bulk_set_push_values.load(Ordering::Relaxed),
            passes_completed: self.passes_completed.load(Ordering::Relaxed),
            passes_preempted: self.passes_preempted.load(Ordering::Relaxed),
            ring_version_abandons: self.ring_version_abandons.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub pass_nanoseconds: u64,
    pub out_bulk_set_pushes: u64,
    pub out_bulk_set_push_values: u64,
    pub passes_completed: u64,
    pub passes_preempted: u64,
    pub ring_version_abandons: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let registry = ReplicationMetrics::new();
        assert_eq!(registry.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_push() {
        let registry = ReplicationMetrics::new();

        registry.record_push(3);
        registry.record_push(2);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.out_bulk_set_pushes, 2);
        assert_eq!(snapshot.out_bulk_set_push_values, 5);
    }

    #[test]
    fn test_pass_nanoseconds_is_a_gauge() {
        let registry = ReplicationMetrics::new();
        registry.set_pass_nanoseconds(500);
        registry.set_pass_nanoseconds(200);
        assert_eq!(registry.snapshot().pass_nanoseconds, 200);
    }

    #[test]
    fn test_to_json() {
        let registry = ReplicationMetrics::new();
        registry.record_push(4);
        registry.increment_passes_preempted();

        let json = registry.to_json();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["out_bulk_set_pushes"], 1);
        assert_eq!(parsed["out_bulk_set_push_values"], 4);
        assert_eq!(parsed["passes_preempted"], 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(ReplicationMetrics::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.record_push(2);
                    reg.increment_ring_version_abandons();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.out_bulk_set_pushes, 1000);
        assert_eq!(snapshot.out_bulk_set_push_values, 2000);
        assert_eq!(snapshot.ring_version_abandons, 1000);
    }
}
