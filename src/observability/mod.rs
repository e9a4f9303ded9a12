//! Observability subsystem for ringstore
//!
//! This module provides:
//! - A closed vocabulary of log events (`Event`), emitted through `tracing`
//! - Push replication metrics (`ReplicationMetrics`)
//! - A drop guard that times passes (`PassTimer`)
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on replication decisions
//! 3. Exporting metrics is left to the embedding process
//!
//! # Usage
//!
//! ```ignore
//! use ringstore::observability::{Event, ReplicationMetrics};
//!
//! tracing::info!(event = %Event::PushReplicationStartup, "push replication started");
//!
//! let metrics = ReplicationMetrics::new();
//! metrics.record_push(12);
//! println!("{}", metrics.to_json());
//! ```

mod events;
mod metrics;
mod scope;

pub use events::Event;
pub use metrics::{MetricsSnapshot, ReplicationMetrics};
pub use scope::PassTimer;
