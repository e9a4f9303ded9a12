//! Push replication
//!
//! A node holds data for partitions it does not own: after membership
//! changes, or when it accepted writes on behalf of an unavailable replica.
//! Push replication periodically finds that data and sends it to the nodes
//! that do own it.
//!
//! - `tiler`: splits each partition into disjoint per-worker key slices
//! - `scratch`: per-worker buffers reused across passes
//! - `pass`: one concurrent sweep of the partition space
//! - `scheduler`: the jittered loop and its control notifications
//! - `state`: startup/shutdown/run-now for one store
//!
//! Nothing here is fatal. Stale rings, unreadable keys and lost messages all
//! degrade to "try again next pass", and the protocol is idempotent.

mod pass;
mod scheduler;
mod scratch;
mod state;
mod tiler;

pub use pass::PassResources;
pub use scheduler::{jittered_interval, Action, Notification, JITTER_STDDEV};
pub use scratch::{ScratchPool, WorkerScratch};
pub use state::PushReplicationState;
pub use tiler::{PartitionLayout, MAX_PARTITION_BIT_COUNT};
