//! Replication Subsystem
//!
//! Background replication between the nodes of a ring:
//! - Bulk-set messages: byte-bounded batches of key/timestamp/value entries
//! - Push replication: periodic sweep that relocates data this node holds
//!   for partitions it does not own
//!
//! Ownership is decided by the ring (`crate::ring`). Replication never
//! trusts an ownership decision made against a ring version that has since
//! changed.

mod bulk_set;
mod config;
mod errors;
pub mod push;

pub use bulk_set::{
    BulkSetEntry, BulkSetMessage, Entries, BULK_SET_MSG_TYPE, ENTRY_HEADER_LENGTH,
    MIN_ENTRY_LENGTH, MSG_HEADER_LENGTH,
};
pub use config::PushReplicationConfig;
pub use errors::{ReplicationError, ReplicationErrorKind, ReplicationResult};
pub use push::PushReplicationState;
