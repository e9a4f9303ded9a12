//! Shared harness for push replication integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ringstore::locmap::{Key, KeyRange, LocalIndex, MemoryIndex, ReadResult, ScanEntry};
use ringstore::replication::BulkSetMessage;
use ringstore::ring::{MsgRing, Ring, StaticRing};
use ringstore::timestamp;
use ringstore::{ValueStore, ValueStoreConfig};

/// One message handed to the transport.
#[derive(Debug, Clone)]
pub struct Sent {
    pub partition: u32,
    pub msg: BulkSetMessage,
    pub timeout: Duration,
}

/// Transport that records every message instead of delivering it.
pub struct RecordingMsgRing {
    ring: Mutex<Option<StaticRing>>,
    sent: Mutex<Vec<Sent>>,
    send_delay: Mutex<Duration>,
    bump_version_on_read: AtomicBool,
    reads: AtomicU64,
}

impl RecordingMsgRing {
    pub fn new(ring: StaticRing) -> Arc<Self> {
        Arc::new(Self {
            ring: Mutex::new(Some(ring)),
            sent: Mutex::new(Vec::new()),
            send_delay: Mutex::new(Duration::ZERO),
            bump_version_on_read: AtomicBool::new(false),
            reads: AtomicU64::new(0),
        })
    }

    /// A transport that does not know the ring yet.
    pub fn without_ring() -> Arc<Self> {
        let msg_ring = Self::new(StaticRing::new(0, 0, []));
        msg_ring.set_ring(None);
        msg_ring
    }

    pub fn set_ring(&self, ring: Option<StaticRing>) {
        *self.ring.lock().unwrap() = ring;
    }

    /// Every `send` blocks for `delay` before recording.
    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = delay;
    }

    /// Every `ring()` call reports a newer version than the last.
    pub fn bump_version_on_read(&self) {
        self.bump_version_on_read.store(true, Ordering::SeqCst);
    }

    /// Move the ring to the next version, keeping ownership.
    pub fn bump_version(&self) {
        let mut guard = self.ring.lock().unwrap();
        if let Some(ring) = guard.as_mut() {
            *ring = ring.with_version(ring.version() + 1);
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl MsgRing for RecordingMsgRing {
    fn ring(&self) -> Option<Arc<dyn Ring>> {
        let mut guard = self.ring.lock().unwrap();
        let ring = guard.as_mut()?;
        let reads = self.reads.fetch_add(1, Ordering::SeqCst);
        if self.bump_version_on_read.load(Ordering::SeqCst) {
            *ring = ring.with_version(reads + 1);
        }
        Some(Arc::new(ring.clone()))
    }

    fn msg_to_other_replicas(&self, msg: BulkSetMessage, partition: u32, timeout: Duration) {
        let delay = *self.send_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.sent.lock().unwrap().push(Sent {
            partition,
            msg,
            timeout,
        });
    }
}

type ScanHook = Box<dyn Fn(KeyRange) + Send + Sync>;

/// Index that runs a hook at the start of every range scan.
pub struct HookedIndex {
    inner: Arc<MemoryIndex>,
    on_scan: ScanHook,
}

impl HookedIndex {
    pub fn new(
        inner: Arc<MemoryIndex>,
        on_scan: impl Fn(KeyRange) + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            inner,
            on_scan: Box::new(on_scan),
        })
    }
}

impl LocalIndex for HookedIndex {
    fn scan_range(
        &self,
        range: KeyRange,
        exclude_flags: u64,
        cutoff: u64,
        callback: &mut dyn FnMut(ScanEntry) -> bool,
    ) -> bool {
        (self.on_scan)(range);
        self.inner.scan_range(range, exclude_flags, cutoff, callback)
    }

    fn read(&self, key: Key, buf: &mut Vec<u8>) -> ReadResult<u64> {
        self.inner.read(key, buf)
    }
}

/// Configuration with a schedule far enough out that only explicit passes
/// run during a test.
pub fn test_config(workers: usize) -> ValueStoreConfig {
    ValueStoreConfig {
        push_replication_interval_secs: 3600,
        push_replication_workers: workers,
        ..Default::default()
    }
}

/// Timestamp bits for a write `age` ago.
pub fn written_ago(age: Duration) -> u64 {
    timestamp::cutoff(timestamp::now_bits(), timestamp::window_bits(age))
        & !timestamp::INACTIVE
}

/// Timestamp bits old enough to be pushed under the default settings.
pub fn settled() -> u64 {
    written_ago(Duration::from_secs(600))
}

/// First key of `partition` under `partition_bit_count`, offset by `offset`.
pub fn key_in(partition: u64, partition_bit_count: u32, offset: u64, b: u64) -> Key {
    Key::new((partition << (64 - partition_bit_count)) + offset, b)
}

pub fn store_with(
    config: ValueStoreConfig,
    msg_ring: &Arc<RecordingMsgRing>,
) -> (Arc<MemoryIndex>, ValueStore) {
    let index = Arc::new(MemoryIndex::new());
    let transport: Arc<dyn MsgRing> = msg_ring.clone();
    let store = ValueStore::new(config, index.clone(), Some(transport));
    (index, store)
}

pub fn store_with_index(
    config: ValueStoreConfig,
    msg_ring: &Arc<RecordingMsgRing>,
    index: Arc<dyn LocalIndex>,
) -> ValueStore {
    let transport: Arc<dyn MsgRing> = msg_ring.clone();
    ValueStore::new(config, index, Some(transport))
}
