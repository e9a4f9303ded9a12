//! One push replication pass
//!
//! A pass captures the ring once, then runs one worker per configured worker
//! index on the blocking pool. Each worker sweeps every partition starting
//! at its staggered offset, skips partitions the local node is responsible
//! for, and for the rest scans its own slice of the partition and pushes the
//! first message-sized batch of eligible values to the partition's replicas.
//!
//! Two things stop a worker early:
//! - the shared abort flag, set when a notification arrives mid-pass
//! - the ring version moving away from the captured snapshot
//!
//! Both are checked between partitions; the flag is checked again, and the
//! ring re-validated, right before a message is built.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::mpsc;

use crate::locmap::{LocalIndex, ReadError};
use crate::observability::{Event, PassTimer, ReplicationMetrics};
use crate::replication::bulk_set::{BulkSetMessage, ENTRY_HEADER_LENGTH, MSG_HEADER_LENGTH};
use crate::replication::config::PushReplicationConfig;
use crate::ring::{MsgRing, Ring};
use crate::timestamp::{self, DELETION, LOCAL_REMOVAL};

use super::scheduler::Notification;
use super::scratch::{ScratchPool, WorkerScratch};
use super::tiler::PartitionLayout;

/// Everything a pass reads from its store.
#[derive(Clone)]
pub struct PassResources {
    /// Store name, used to tell stores apart in logs.
    pub name: Arc<str>,
    pub config: PushReplicationConfig,
    pub index: Arc<dyn LocalIndex>,
    pub msg_ring: Option<Arc<dyn MsgRing>>,
    pub metrics: Arc<ReplicationMetrics>,
}

/// State shared read-only by the workers of one pass. Only the orchestrator
/// writes `abort`.
struct PassContext {
    resources: PassResources,
    msg_ring: Arc<dyn MsgRing>,
    ring: Arc<dyn Ring>,
    ring_version: u64,
    layout: PartitionLayout,
    abort: AtomicBool,
}

impl PassContext {
    fn aborted(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }

    /// Whether the transport still reports the ring version this pass
    /// started with.
    fn ring_current(&self) -> bool {
        matches!(self.msg_ring.ring(), Some(ring) if ring.version() == self.ring_version)
    }
}

enum Wake {
    Finished(Vec<Result<WorkerScratch, tokio::task::JoinError>>),
    Notified(Option<Notification>),
}

/// Run one pass.
///
/// Returns the notification that preempted the pass, if any, so the caller
/// can handle it without sleeping first. A pass with no transport or no ring
/// is a no-op.
pub(crate) async fn run_pass(
    resources: &PassResources,
    scratch: &mut ScratchPool,
    notifications: &mut mpsc::Receiver<Notification>,
) -> Option<Notification> {
    let msg_ring = resources.msg_ring.clone()?;
    let _timer = PassTimer::start(resources.name.as_ref(), Arc::clone(&resources.metrics));
    let ring = msg_ring.ring()?;
    let config = &resources.config;

    let layout = match PartitionLayout::new(ring.partition_bit_count(), config.workers) {
        Ok(layout) => layout,
        Err(err) => {
            tracing::warn!(
                event = %Event::PushReplicationInvalidLayout,
                name = %resources.name,
                error = %err,
                "push replication pass skipped"
            );
            return None;
        }
    };
    let workers = layout.worker_count() as usize;
    scratch.grow(workers, config.key_list_capacity(), config.value_cap);

    let ctx = Arc::new(PassContext {
        resources: resources.clone(),
        msg_ring,
        ring_version: ring.version(),
        ring,
        layout,
        abort: AtomicBool::new(false),
    });

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let ctx = Arc::clone(&ctx);
            let mut buffers = scratch.take(worker);
            tokio::task::spawn_blocking(move || {
                run_worker(&ctx, worker as u64, &mut buffers);
                buffers
            })
        })
        .collect();
    let all_done = join_all(handles);
    tokio::pin!(all_done);

    let wake = tokio::select! {
        results = &mut all_done => Wake::Finished(results),
        notification = notifications.recv() => Wake::Notified(notification),
    };
    let (results, held) = match wake {
        Wake::Finished(results) => (results, None),
        Wake::Notified(notification) => {
            ctx.abort.store(true, Ordering::Release);
            (all_done.await, Some(notification))
        }
    };

    for (worker, result) in results.into_iter().enumerate() {
        match result {
            Ok(buffers) => scratch.restore(worker, buffers),
            Err(err) => tracing::error!(
                event = %Event::PushReplicationWorkerFailed,
                name = %resources.name,
                worker,
                error = %err,
                "push replication worker failed"
            ),
        }
    }

    match held {
        None => {
            resources.metrics.increment_passes_completed();
            None
        }
        Some(notification) => {
            resources.metrics.increment_passes_preempted();
            tracing::info!(
                event = %Event::PushReplicationPassPreempted,
                name = %resources.name,
                action = ?notification.as_ref().map(|n| n.action()),
                "push replication pass preempted"
            );
            notification
        }
    }
}

/// Sweep every partition once, starting at this worker's offset.
fn run_worker(ctx: &PassContext, worker: u64, scratch: &mut WorkerScratch) {
    let begin = ctx.layout.partition_begin(worker);
    let mut partition = begin;
    loop {
        if ctx.aborted() {
            break;
        }
        if !ctx.ring_current() {
            ctx.resources.metrics.increment_ring_version_abandons();
            tracing::debug!(
                event = %Event::PushReplicationRingChanged,
                name = %ctx.resources.name,
                worker,
                partition,
                "ring changed, worker stopping"
            );
            break;
        }
        if !ctx.ring.responsible(partition as u32) {
            push_partition(ctx, partition, worker, scratch);
        }
        partition = ctx.layout.next_partition(partition);
        if partition == begin {
            break;
        }
    }
}

/// Whether a value with these timestamp bits may be pushed.
fn replicable(timestamp_bits: u64, cutoff: u64, tombstone_cutoff: u64) -> bool {
    timestamp_bits & LOCAL_REMOVAL == 0
        && timestamp_bits < cutoff
        && (timestamp_bits & DELETION == 0 || timestamp_bits >= tombstone_cutoff)
}

/// Push the first message-sized batch of eligible values in this worker's
/// slice of `partition`.
///
/// Values past the batch are left for a later pass: once the receivers
/// acknowledge this batch, those keys stop qualifying and the next batch
/// starts where this one ended.
fn push_partition(ctx: &PassContext, partition: u64, worker: u64, scratch: &mut WorkerScratch) {
    let Some(range) = ctx.layout.worker_range(partition, worker) else {
        return;
    };
    let resources = &ctx.resources;
    let config = &resources.config;

    let now = timestamp::now_bits();
    let cutoff = timestamp::cutoff(now, timestamp::window_bits(config.ignore_recent));
    let tombstone_cutoff =
        timestamp::cutoff(now, timestamp::window_bits(config.tombstone_discard_age));

    let WorkerScratch { keys, value } = scratch;
    keys.clear();

    let mut available = config.msg_cap.saturating_sub(MSG_HEADER_LENGTH);
    let largest_entry = available;
    resources
        .index
        .scan_range(range, LOCAL_REMOVAL, cutoff, &mut |entry| {
            if !replicable(entry.timestamp_bits, cutoff, tombstone_cutoff) {
                return true;
            }
            let entry_length = ENTRY_HEADER_LENGTH + entry.length as usize;
            if entry_length > largest_entry {
                // Can never fit in a message.
                return true;
            }
            if entry_length > available {
                return false;
            }
            available -= entry_length;
            keys.push(entry.key);
            true
        });

    if keys.is_empty() || ctx.aborted() {
        return;
    }
    if !ctx.ring_current() {
        resources.metrics.increment_ring_version_abandons();
        tracing::debug!(
            event = %Event::PushReplicationRingChanged,
            name = %resources.name,
            worker,
            partition,
            "ring changed, partition abandoned"
        );
        return;
    }

    let mut msg = BulkSetMessage::new(config.msg_cap, ctx.ring.node_id());
    for &key in keys.iter() {
        let (timestamp_bits, found) = match resources.index.read(key, value) {
            Ok(bits) => (bits, true),
            // Purged since the scan.
            Err(ReadError::NotFound { timestamp_bits: 0 }) => continue,
            // Deleted or removed since the scan; may still be a tombstone
            // worth pushing.
            Err(ReadError::NotFound { timestamp_bits }) => (timestamp_bits, false),
            Err(err) => {
                tracing::debug!(
                    event = %Event::PushReplicationReadFailed,
                    name = %resources.name,
                    key_a = key.a,
                    key_b = key.b,
                    error = %err,
                    "skipping unreadable key"
                );
                continue;
            }
        };
        if !replicable(timestamp_bits, cutoff, tombstone_cutoff) {
            continue;
        }
        let payload: &[u8] = if found { value.as_slice() } else { &[] };
        if !msg.add(key, timestamp_bits, payload) {
            break;
        }
    }

    if msg.is_empty() {
        return;
    }
    let entries = msg.entry_count() as u64;
    resources.metrics.record_push(entries);
    tracing::trace!(
        event = %Event::PushReplicationMsgSent,
        name = %resources.name,
        worker,
        partition,
        entries,
        bytes = msg.len(),
        "bulk set pushed"
    );
    ctx.msg_ring
        .msg_to_other_replicas(msg, partition as u32, config.msg_timeout);
}
