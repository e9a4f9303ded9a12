//! Replication Configuration
//!
//! Push replication settings as the engine consumes them. Built once from
//! `ValueStoreConfig` when the store is constructed and immutable for the
//! store's lifetime; there is no live reconfiguration.

use std::time::Duration;

use super::bulk_set::{MIN_ENTRY_LENGTH, MSG_HEADER_LENGTH};
use super::errors::{ReplicationError, ReplicationResult};

/// Push replication configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReplicationConfig {
    /// Mean time between passes. Each delay is jittered around this value.
    pub interval: Duration,

    /// Concurrent workers per pass.
    pub workers: usize,

    /// Timeout handed to the transport with each outgoing message.
    pub msg_timeout: Duration,

    /// Byte cap of one bulk-set message, header included.
    pub msg_cap: usize,

    /// Largest value the store holds; sizes each worker's value buffer.
    pub value_cap: usize,

    /// Values written more recently than this are left to the write path.
    pub ignore_recent: Duration,

    /// Tombstones older than this are about to be purged and are not pushed.
    pub tombstone_discard_age: Duration,
}

impl PushReplicationConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> ReplicationResult<()> {
        if self.interval.is_zero() {
            return Err(ReplicationError::configuration_error(
                "push replication interval must be > 0",
            ));
        }
        if self.workers == 0 {
            return Err(ReplicationError::configuration_error(
                "push replication workers must be > 0",
            ));
        }
        if self.msg_timeout.is_zero() {
            return Err(ReplicationError::configuration_error(
                "push replication msg timeout must be > 0",
            ));
        }
        if self.msg_cap < MSG_HEADER_LENGTH + MIN_ENTRY_LENGTH {
            return Err(ReplicationError::configuration_error(format!(
                "bulk set msg cap must be at least {} bytes",
                MSG_HEADER_LENGTH + MIN_ENTRY_LENGTH
            )));
        }
        if self.value_cap == 0 {
            return Err(ReplicationError::configuration_error("value cap must be > 0"));
        }
        Ok(())
    }

    /// Capacity of a worker's key list: the most entries one message can
    /// hold.
    pub fn key_list_capacity(&self) -> usize {
        self.msg_cap / MIN_ENTRY_LENGTH
    }
}

impl Default for PushReplicationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            msg_timeout: Duration::from_millis(100),
            msg_cap: 16 * 1024 * 1024,
            value_cap: 4 * 1024 * 1024,
            ignore_recent: Duration::from_secs(60),
            tombstone_discard_age: Duration::from_secs(4 * 60 * 60),
        }
    }
}
