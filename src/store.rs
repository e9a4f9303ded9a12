//! Value Store
//!
//! The store owns its local index handle, its transport handle and its own
//! push replication loop. Several stores can live in one process; they share
//! nothing.

use std::sync::Arc;

use crate::config::ValueStoreConfig;
use crate::errors::StoreResult;
use crate::locmap::{Key, LocalIndex, ReadResult};
use crate::observability::{MetricsSnapshot, ReplicationMetrics};
use crate::replication::push::{PassResources, PushReplicationState};
use crate::ring::MsgRing;

const DEFAULT_NAME: &str = "valuestore";

/// A replicated value store node.
pub struct ValueStore {
    config: ValueStoreConfig,
    index: Arc<dyn LocalIndex>,
    metrics: Arc<ReplicationMetrics>,
    push_replication: PushReplicationState,
}

impl ValueStore {
    /// Build a store. Nothing runs until `startup`.
    ///
    /// Without a transport the store still serves reads but push
    /// replication passes do nothing.
    pub fn new(
        config: ValueStoreConfig,
        index: Arc<dyn LocalIndex>,
        msg_ring: Option<Arc<dyn MsgRing>>,
    ) -> Self {
        Self::named(DEFAULT_NAME, config, index, msg_ring)
    }

    /// Like `new`, with a name that tags this store's log records.
    pub fn named(
        name: &str,
        config: ValueStoreConfig,
        index: Arc<dyn LocalIndex>,
        msg_ring: Option<Arc<dyn MsgRing>>,
    ) -> Self {
        let metrics = Arc::new(ReplicationMetrics::new());
        let resources = PassResources {
            name: Arc::from(name),
            config: config.push_replication(),
            index: Arc::clone(&index),
            msg_ring,
            metrics: Arc::clone(&metrics),
        };
        Self {
            config,
            index,
            metrics,
            push_replication: PushReplicationState::new(resources),
        }
    }

    /// Validate configuration and start background push replication.
    ///
    /// Calling it again while running is a no-op.
    pub async fn startup(&self) -> StoreResult<()> {
        self.config.validate()?;
        self.push_replication.startup().await;
        Ok(())
    }

    /// Stop background work and wait for it to finish.
    pub async fn shutdown(&self) {
        self.push_replication.shutdown().await;
    }

    /// Run a push replication pass now and wait for it.
    pub async fn push_replication_pass(&self) -> StoreResult<()> {
        self.push_replication.run_now().await?;
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.push_replication.is_running().await
    }

    /// Read a value into `buf`, returning its timestamp bits.
    pub fn read(&self, key: Key, buf: &mut Vec<u8>) -> ReadResult<u64> {
        self.index.read(key, buf)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &ValueStoreConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.push_replication.resources().name
    }
}
