//! In-memory local index

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{Key, KeyRange, LocalIndex, ReadError, ReadResult, ScanEntry};
use crate::timestamp::{DELETION, LOCAL_REMOVAL};

#[derive(Debug, Clone)]
struct Stored {
    timestamp_bits: u64,
    value: Vec<u8>,
}

/// Key/value records held in a sorted map.
///
/// Writes follow last-writer-wins on timestamp bits: a write older than (or
/// equal to) the stored record is ignored.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    records: RwLock<BTreeMap<Key, Stored>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value. Returns the timestamp bits that were in place before
    /// the call (0 if none); the write is applied only if newer.
    pub fn set(&self, key: Key, timestamp_bits: u64, value: &[u8]) -> u64 {
        let mut records = match self.records.write() {
            Ok(r) => r,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = records.get(&key).map(|s| s.timestamp_bits).unwrap_or(0);
        if timestamp_bits > previous {
            records.insert(
                key,
                Stored {
                    timestamp_bits,
                    value: value.to_vec(),
                },
            );
        }
        previous
    }

    /// Write a tombstone for `key`.
    pub fn delete(&self, key: Key, timestamp_bits: u64) -> u64 {
        self.set(key, timestamp_bits | DELETION, &[])
    }

    /// Flag the current record as locally removed. Returns false if the key
    /// is unknown.
    pub fn mark_local_removal(&self, key: Key) -> bool {
        let mut records = match self.records.write() {
            Ok(r) => r,
            Err(poisoned) => poisoned.into_inner(),
        };
        match records.get_mut(&key) {
            Some(stored) => {
                stored.timestamp_bits |= LOCAL_REMOVAL;
                true
            }
            None => false,
        }
    }

    /// Drop every trace of `key`.
    pub fn purge(&self, key: Key) -> bool {
        let mut records = match self.records.write() {
            Ok(r) => r,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.remove(&key).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalIndex for MemoryIndex {
    fn scan_range(
        &self,
        range: KeyRange,
        exclude_flags: u64,
        cutoff: u64,
        callback: &mut dyn FnMut(ScanEntry) -> bool,
    ) -> bool {
        let records = match self.records.read() {
            Ok(r) => r,
            Err(poisoned) => poisoned.into_inner(),
        };
        let bounds = Key::new(range.begin, 0)..=Key::new(range.end, u64::MAX);
        for (key, stored) in records.range(bounds) {
            if stored.timestamp_bits & exclude_flags != 0 || stored.timestamp_bits >= cutoff {
                continue;
            }
            let entry = ScanEntry {
                key: *key,
                timestamp_bits: stored.timestamp_bits,
                length: stored.value.len() as u32,
            };
            if !callback(entry) {
                return true;
            }
        }
        false
    }

    fn read(&self, key: Key, buf: &mut Vec<u8>) -> ReadResult<u64> {
        let records = self
            .records
            .read()
            .map_err(|_| ReadError::Unavailable("index lock poisoned".into()))?;
        let Some(stored) = records.get(&key) else {
            return Err(ReadError::NotFound { timestamp_bits: 0 });
        };
        if stored.timestamp_bits & (DELETION | LOCAL_REMOVAL) != 0 {
            return Err(ReadError::NotFound {
                timestamp_bits: stored.timestamp_bits,
            });
        }
        buf.clear();
        buf.extend_from_slice(&stored.value);
        Ok(stored.timestamp_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::encode;

    fn collect(index: &MemoryIndex, range: KeyRange, exclude: u64, cutoff: u64) -> Vec<Key> {
        let mut keys = Vec::new();
        index.scan_range(range, exclude, cutoff, &mut |entry| {
            keys.push(entry.key);
            true
        });
        keys
    }

    #[test]
    fn test_set_newer_wins() {
        let index = MemoryIndex::new();
        let key = Key::new(1, 1);
        assert_eq!(index.set(key, encode(10, 0), b"a"), 0);
        assert_eq!(index.set(key, encode(5, 0), b"old"), encode(10, 0));

        let mut buf = Vec::new();
        assert_eq!(index.read(key, &mut buf), Ok(encode(10, 0)));
        assert_eq!(buf, b"a");
    }

    #[test]
    fn test_read_missing_is_purged() {
        let index = MemoryIndex::new();
        let mut buf = Vec::new();
        assert_eq!(
            index.read(Key::new(9, 9), &mut buf),
            Err(ReadError::NotFound { timestamp_bits: 0 })
        );
    }

    #[test]
    fn test_read_tombstone_reports_bits() {
        let index = MemoryIndex::new();
        let key = Key::new(1, 2);
        index.set(key, encode(10, 0), b"v");
        index.delete(key, encode(11, 0));

        let mut buf = Vec::new();
        assert_eq!(
            index.read(key, &mut buf),
            Err(ReadError::NotFound {
                timestamp_bits: encode(11, DELETION)
            })
        );
    }

    #[test]
    fn test_read_reuses_buffer() {
        let index = MemoryIndex::new();
        let key = Key::new(3, 3);
        index.set(key, encode(1, 0), b"xyz");

        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(b"stale contents");
        index.read(key, &mut buf).unwrap();
        assert_eq!(buf, b"xyz");
        assert!(buf.capacity() >= 64);
    }

    #[test]
    fn test_scan_range_bounds_and_order() {
        let index = MemoryIndex::new();
        for a in [5u64, 1, 3, 9] {
            index.set(Key::new(a, 0), encode(1, 0), b"v");
        }
        index.set(Key::new(3, 1), encode(1, 0), b"v");

        let keys = collect(&index, KeyRange::new(2, 5), 0, u64::MAX);
        assert_eq!(keys, vec![Key::new(3, 0), Key::new(3, 1), Key::new(5, 0)]);
    }

    #[test]
    fn test_scan_excludes_flags_and_recent() {
        let index = MemoryIndex::new();
        index.set(Key::new(1, 0), encode(10, 0), b"keep");
        index.set(Key::new(2, 0), encode(10, 0), b"removed");
        index.mark_local_removal(Key::new(2, 0));
        index.set(Key::new(3, 0), encode(50, 0), b"recent");

        let keys = collect(&index, KeyRange::new(0, u64::MAX), LOCAL_REMOVAL, encode(50, 0));
        assert_eq!(keys, vec![Key::new(1, 0)]);
    }

    #[test]
    fn test_scan_stops_early() {
        let index = MemoryIndex::new();
        for a in 0..10u64 {
            index.set(Key::new(a, 0), encode(1, 0), b"v");
        }
        let mut seen = 0;
        let stopped = index.scan_range(KeyRange::new(0, u64::MAX), 0, u64::MAX, &mut |_| {
            seen += 1;
            seen < 3
        });
        assert!(stopped);
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_purge() {
        let index = MemoryIndex::new();
        let key = Key::new(1, 1);
        index.set(key, encode(1, 0), b"v");
        assert_eq!(index.len(), 1);
        assert!(index.purge(key));
        assert!(index.is_empty());
        assert!(!index.purge(key));
    }
}
