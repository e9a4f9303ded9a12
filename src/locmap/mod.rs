//! Local key location index
//!
//! The replication engine never touches the storage engine directly. It sees
//! the local store through `LocalIndex`: a bounded range scan over 128-bit
//! keys and a point read of a value into a caller-owned buffer.
//!
//! `MemoryIndex` is an in-process implementation used by embedders that keep
//! values in memory and by the test suites.

mod memory;

pub use memory::MemoryIndex;

use thiserror::Error;

/// A 128-bit key split into two halves.
///
/// The top bits of `a` select the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key {
    pub a: u64,
    pub b: u64,
}

impl Key {
    pub fn new(a: u64, b: u64) -> Self {
        Self { a, b }
    }

    /// Partition this key belongs to under a ring with `partition_bit_count`
    /// partition bits.
    pub fn partition(&self, partition_bit_count: u32) -> u32 {
        if partition_bit_count == 0 {
            return 0;
        }
        (self.a >> (64 - partition_bit_count)) as u32
    }
}

/// Inclusive range over `Key::a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub begin: u64,
    pub end: u64,
}

impl KeyRange {
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    pub fn contains(&self, key_a: u64) -> bool {
        self.begin <= key_a && key_a <= self.end
    }

    /// Number of `Key::a` values covered, as u128 so the full space fits.
    pub fn span(&self) -> u128 {
        u128::from(self.end) - u128::from(self.begin) + 1
    }
}

/// One entry visited by a range scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanEntry {
    pub key: Key,
    pub timestamp_bits: u64,
    pub length: u32,
}

/// Point read failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// No live value. A zero timestamp means the key has been purged
    /// entirely; otherwise the bits describe the tombstone or local removal.
    #[error("not found (timestamp bits {timestamp_bits:#x})")]
    NotFound { timestamp_bits: u64 },

    /// The value could not be read for any other reason.
    #[error("value unavailable: {0}")]
    Unavailable(String),
}

/// Result type for point reads
pub type ReadResult<T> = Result<T, ReadError>;

/// The local store as seen by replication.
pub trait LocalIndex: Send + Sync {
    /// Visit entries with `range.begin <= key.a <= range.end` whose
    /// timestamp bits have none of `exclude_flags` set and are strictly
    /// below `cutoff`, in key order.
    ///
    /// The callback returns `false` to stop the scan. Returns `true` if the
    /// scan was stopped early by the callback.
    fn scan_range(
        &self,
        range: KeyRange,
        exclude_flags: u64,
        cutoff: u64,
        callback: &mut dyn FnMut(ScanEntry) -> bool,
    ) -> bool;

    /// Read the current value for `key` into `buf`, replacing its contents.
    /// Returns the value's timestamp bits.
    fn read(&self, key: Key, buf: &mut Vec<u8>) -> ReadResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_partition() {
        let key = Key::new(0b11 << 62, 7);
        assert_eq!(key.partition(2), 3);
        assert_eq!(key.partition(1), 1);
        assert_eq!(key.partition(0), 0);
        assert_eq!(Key::new(u64::MAX, 0).partition(32), u32::MAX);
    }

    #[test]
    fn test_key_ordering() {
        assert!(Key::new(1, 9) < Key::new(2, 0));
        assert!(Key::new(1, 1) < Key::new(1, 2));
    }

    #[test]
    fn test_range_span_full_space() {
        let range = KeyRange::new(0, u64::MAX);
        assert_eq!(range.span(), 1u128 << 64);
        assert!(range.contains(u64::MAX));
    }
}
