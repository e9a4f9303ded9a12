//! ringstore - value store node with push replication
//!
//! A node keeps values in a local index and periodically pushes the ones it
//! holds for partitions it does not own to the replicas that do.
//!
//! - `timestamp`: packed timestamp bits and their flags
//! - `locmap`: the local key index
//! - `ring`: partition ownership and cluster transport
//! - `replication`: bulk-set messages and the push replication engine
//! - `store`: the store that owns all of the above
//! - `observability`: events, metrics and pass timing

pub mod config;
pub mod errors;
pub mod locmap;
pub mod observability;
pub mod replication;
pub mod ring;
pub mod store;
pub mod timestamp;

pub use config::ValueStoreConfig;
pub use errors::{StoreError, StoreResult};
pub use store::ValueStore;
