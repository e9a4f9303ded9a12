//! PassTimer for publishing pass duration on every exit path
//!
//! A pass can end by completing, by preemption, or by bailing out early when
//! the ring is missing or cannot be tiled. The timer is a drop guard so each
//! of those paths publishes its elapsed time without repeating itself.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::events::Event;
use super::metrics::ReplicationMetrics;

/// Measures one pass and publishes its duration when dropped.
///
/// # Behavior
///
/// - Stores elapsed nanoseconds in the pass-duration gauge on drop
/// - Logs `PUSH_REPLICATION_PASS_COMPLETE` at DEBUG on drop
pub struct PassTimer {
    name: String,
    start: Instant,
    metrics: Arc<ReplicationMetrics>,
}

impl PassTimer {
    /// Start timing. `name` identifies the store in the log record.
    pub fn start(name: impl Into<String>, metrics: Arc<ReplicationMetrics>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            metrics,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PassTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        let nanos = elapsed.as_nanos().min(u128::from(u64::MAX)) as u64;
        self.metrics.set_pass_nanoseconds(nanos);
        tracing::debug!(
            event = %Event::PushReplicationPassComplete,
            name = %self.name,
            elapsed_ns = nanos,
            "push replication pass completed"
        );
    }
}
