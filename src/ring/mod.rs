//! Partition ring and cluster transport interfaces
//!
//! Ring construction and message delivery live outside this crate. The
//! replication engine only needs to ask which partitions the local node owns,
//! notice when membership changes (the ring version moves), and hand a
//! message to the transport for the other replicas of a partition.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::replication::BulkSetMessage;

/// An immutable view of cluster membership.
pub trait Ring: Send + Sync {
    /// Advances every time membership changes.
    fn version(&self) -> u64;

    /// Partitions are the top `partition_bit_count` bits of `Key::a`.
    fn partition_bit_count(&self) -> u32;

    /// Whether the local node is a replica for `partition`.
    fn responsible(&self, partition: u32) -> bool;

    /// Local node id, written into outgoing message headers so that
    /// receivers can acknowledge.
    fn node_id(&self) -> u64 {
        0
    }
}

/// Cluster transport.
pub trait MsgRing: Send + Sync {
    /// Current ring, if membership is known yet.
    fn ring(&self) -> Option<Arc<dyn Ring>>;

    /// Deliver `msg` to the other replicas of `partition`. Best effort; the
    /// caller does not wait for or inspect the outcome.
    fn msg_to_other_replicas(&self, msg: BulkSetMessage, partition: u32, timeout: Duration);
}

/// A fixed ring snapshot.
#[derive(Debug, Clone)]
pub struct StaticRing {
    version: u64,
    partition_bit_count: u32,
    node_id: u64,
    responsible: HashSet<u32>,
}

impl StaticRing {
    pub fn new(version: u64, partition_bit_count: u32, responsible: impl IntoIterator<Item = u32>) -> Self {
        Self {
            version,
            partition_bit_count,
            node_id: 0,
            responsible: responsible.into_iter().collect(),
        }
    }

    pub fn with_node_id(mut self, node_id: u64) -> Self {
        self.node_id = node_id;
        self
    }

    /// Same ownership under a new version.
    pub fn with_version(&self, version: u64) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }
}

impl Ring for StaticRing {
    fn version(&self) -> u64 {
        self.version
    }

    fn partition_bit_count(&self) -> u32 {
        self.partition_bit_count
    }

    fn responsible(&self, partition: u32) -> bool {
        self.responsible.contains(&partition)
    }

    fn node_id(&self) -> u64 {
        self.node_id
    }
}
