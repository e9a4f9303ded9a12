//! Value Store Configuration
//!
//! Loaded once when a store is built. Every field has a default, so a config
//! file only needs the settings it changes. Values are fixed for the store's
//! lifetime.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{StoreError, StoreResult};
use crate::replication::{PushReplicationConfig, MIN_ENTRY_LENGTH, MSG_HEADER_LENGTH};

/// Value store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueStoreConfig {
    /// Mean seconds between push replication passes (default: 60)
    #[serde(default = "default_push_replication_interval_secs")]
    pub push_replication_interval_secs: u64,

    /// Concurrent workers per pass (default: available parallelism)
    #[serde(default = "default_push_replication_workers")]
    pub push_replication_workers: usize,

    /// Transport timeout for each outgoing message (default: 100)
    #[serde(default = "default_push_replication_msg_timeout_ms")]
    pub push_replication_msg_timeout_ms: u64,

    /// Byte cap of one bulk-set message (default: 16 MiB)
    #[serde(default = "default_bulk_set_msg_cap")]
    pub bulk_set_msg_cap: usize,

    /// Largest value the store holds (default: 4 MiB)
    #[serde(default = "default_value_cap")]
    pub value_cap: usize,

    /// Values newer than this are not pushed (default: 60)
    #[serde(default = "default_replication_ignore_recent_secs")]
    pub replication_ignore_recent_secs: u64,

    /// Tombstones older than this are not pushed (default: 4 hours)
    #[serde(default = "default_tombstone_discard_age_secs")]
    pub tombstone_discard_age_secs: u64,
}

fn default_push_replication_interval_secs() -> u64 {
    60
}

fn default_push_replication_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_push_replication_msg_timeout_ms() -> u64 {
    100
}

fn default_bulk_set_msg_cap() -> usize {
    16 * 1024 * 1024
}

fn default_value_cap() -> usize {
    4 * 1024 * 1024
}

fn default_replication_ignore_recent_secs() -> u64 {
    60
}

fn default_tombstone_discard_age_secs() -> u64 {
    4 * 60 * 60
}

impl Default for ValueStoreConfig {
    fn default() -> Self {
        Self {
            push_replication_interval_secs: default_push_replication_interval_secs(),
            push_replication_workers: default_push_replication_workers(),
            push_replication_msg_timeout_ms: default_push_replication_msg_timeout_ms(),
            bulk_set_msg_cap: default_bulk_set_msg_cap(),
            value_cap: default_value_cap(),
            replication_ignore_recent_secs: default_replication_ignore_recent_secs(),
            tombstone_discard_age_secs: default_tombstone_discard_age_secs(),
        }
    }
}

impl ValueStoreConfig {
    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("Failed to read config: {}", e)))?;

        let config: ValueStoreConfig = serde_json::from_str(&content)
            .map_err(|e| StoreError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.push_replication_interval_secs == 0 {
            return Err(StoreError::Config(
                "push_replication_interval_secs must be > 0".into(),
            ));
        }

        if self.push_replication_workers == 0 {
            return Err(StoreError::Config(
                "push_replication_workers must be > 0".into(),
            ));
        }

        if self.push_replication_msg_timeout_ms == 0 {
            return Err(StoreError::Config(
                "push_replication_msg_timeout_ms must be > 0".into(),
            ));
        }

        let min_msg_cap = MSG_HEADER_LENGTH + MIN_ENTRY_LENGTH;
        if self.bulk_set_msg_cap < min_msg_cap {
            return Err(StoreError::Config(format!(
                "bulk_set_msg_cap must be at least {} bytes, got {}",
                min_msg_cap, self.bulk_set_msg_cap
            )));
        }

        if self.value_cap == 0 {
            return Err(StoreError::Config("value_cap must be > 0".into()));
        }

        Ok(())
    }

    /// The push replication settings, as the engine consumes them.
    pub fn push_replication(&self) -> PushReplicationConfig {
        PushReplicationConfig {
            interval: Duration::from_secs(self.push_replication_interval_secs),
            workers: self.push_replication_workers,
            msg_timeout: Duration::from_millis(self.push_replication_msg_timeout_ms),
            msg_cap: self.bulk_set_msg_cap,
            value_cap: self.value_cap,
            ignore_recent: Duration::from_secs(self.replication_ignore_recent_secs),
            tombstone_discard_age: Duration::from_secs(self.tombstone_discard_age_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValueStoreConfig::default();
        assert_eq!(config.push_replication_interval_secs, 60);
        assert!(config.push_replication_workers >= 1);
        assert_eq!(config.push_replication_msg_timeout_ms, 100);
        assert_eq!(config.bulk_set_msg_cap, 16 * 1024 * 1024);
        assert_eq!(config.value_cap, 4 * 1024 * 1024);
        assert_eq!(config.replication_ignore_recent_secs, 60);
        assert_eq!(config.tombstone_discard_age_secs, 14_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ValueStoreConfig =
            serde_json::from_str(r#"{"push_replication_workers": 3}"#).unwrap();
        assert_eq!(config.push_replication_workers, 3);
        assert_eq!(config.push_replication_interval_secs, 60);
        assert_eq!(config.value_cap, 4 * 1024 * 1024);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = ValueStoreConfig {
            push_replication_workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = ValueStoreConfig {
            push_replication_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_tiny_msg_cap() {
        let config = ValueStoreConfig {
            bulk_set_msg_cap: MSG_HEADER_LENGTH + MIN_ENTRY_LENGTH - 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ValueStoreConfig {
            bulk_set_msg_cap: MSG_HEADER_LENGTH + MIN_ENTRY_LENGTH,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_push_replication_projection() {
        let config = ValueStoreConfig {
            push_replication_interval_secs: 5,
            push_replication_workers: 2,
            push_replication_msg_timeout_ms: 250,
            ..Default::default()
        };
        let push = config.push_replication();
        assert_eq!(push.interval, Duration::from_secs(5));
        assert_eq!(push.workers, 2);
        assert_eq!(push.msg_timeout, Duration::from_millis(250));
        assert_eq!(push.msg_cap, config.bulk_set_msg_cap);
        assert_eq!(push.tombstone_discard_age, Duration::from_secs(14_400));
        assert!(push.validate().is_ok());
    }
}
