//! Observability events for ringstore
//!
//! Every log record emitted by the store carries one of these names in its
//! `event` field, so log consumers can match on a closed vocabulary instead
//! of free-form messages.

use std::fmt;

/// Observable events in ringstore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Push replication loop launched
    PushReplicationStartup,
    /// Push replication loop stopped and acknowledged
    PushReplicationShutdown,

    // Pass
    /// A pass finished (completed or preempted)
    PushReplicationPassComplete,
    /// A pass was preempted by a notification
    PushReplicationPassPreempted,
    /// The ring cannot be tiled; pass skipped
    PushReplicationInvalidLayout,
    /// A worker task panicked or was cancelled
    PushReplicationWorkerFailed,

    // Per partition
    /// Ring version moved; work abandoned
    PushReplicationRingChanged,
    /// A single key could not be read and was skipped
    PushReplicationReadFailed,
    /// A bulk-set message was handed to the transport
    PushReplicationMsgSent,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::PushReplicationStartup => "PUSH_REPLICATION_STARTUP",
            Event::PushReplicationShutdown => "PUSH_REPLICATION_SHUTDOWN",
            Event::PushReplicationPassComplete => "PUSH_REPLICATION_PASS_COMPLETE",
            Event::PushReplicationPassPreempted => "PUSH_REPLICATION_PASS_PREEMPTED",
            Event::PushReplicationInvalidLayout => "PUSH_REPLICATION_INVALID_LAYOUT",
            Event::PushReplicationWorkerFailed => "PUSH_REPLICATION_WORKER_FAILED",
            Event::PushReplicationRingChanged => "PUSH_REPLICATION_RING_CHANGED",
            Event::PushReplicationReadFailed => "PUSH_REPLICATION_READ_FAILED",
            Event::PushReplicationMsgSent => "PUSH_REPLICATION_MSG_SENT",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        let events = [
            Event::PushReplicationStartup,
            Event::PushReplicationShutdown,
            Event::PushReplicationPassComplete,
            Event::PushReplicationPassPreempted,
            Event::PushReplicationInvalidLayout,
            Event::PushReplicationWorkerFailed,
            Event::PushReplicationRingChanged,
            Event::PushReplicationReadFailed,
            Event::PushReplicationMsgSent,
        ];
        for event in events {
            let name = event.as_str();
            assert!(name.starts_with("PUSH_REPLICATION_"));
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(
            Event::PushReplicationMsgSent.to_string(),
            "PUSH_REPLICATION_MSG_SENT"
        );
    }
}
