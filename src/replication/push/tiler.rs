//! Partition/worker tiling
//!
//! A pass sweeps every partition with `workers` concurrent workers. Each
//! worker starts its sweep at a staggered partition and, inside every
//! partition, scans only its own slice of the partition's key space:
//!
//! ```text
//! partition p:  [ worker 0 | worker 1 | ... | worker N-1 (takes remainder) ]
//! ```
//!
//! For a fixed partition the slices are disjoint and cover the partition
//! exactly. Widths that do not fit a u64 (a single partition spans 2^64
//! keys) are computed in u128, and the top of the key space is handled by
//! explicit branches.

use crate::locmap::KeyRange;

use crate::replication::errors::{ReplicationError, ReplicationResult};

/// Partitions are addressed as u32, so at most 32 partition bits.
pub const MAX_PARTITION_BIT_COUNT: u32 = 32;

/// Geometry of one pass, computed once from a ring snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionLayout {
    partition_bit_count: u32,
    partition_shift: u32,
    partition_max: u64,
    worker_max: u64,
    worker_partition_piece: u64,
}

impl PartitionLayout {
    pub fn new(partition_bit_count: u32, workers: usize) -> ReplicationResult<Self> {
        if partition_bit_count > MAX_PARTITION_BIT_COUNT {
            return Err(ReplicationError::invalid_layout(format!(
                "partition bit count {} exceeds {}",
                partition_bit_count, MAX_PARTITION_BIT_COUNT
            )));
        }
        if workers == 0 {
            return Err(ReplicationError::invalid_layout("worker count must be > 0"));
        }
        let partition_shift = 64 - partition_bit_count;
        let partition_max = (1u64 << partition_bit_count) - 1;
        let worker_count = workers as u64;
        // 2^64 does not fit a u64 when there is a single partition; with a
        // single worker the piece is never used, otherwise it fits.
        let partition_span = 1u128 << partition_shift;
        let worker_partition_piece =
            (partition_span / u128::from(worker_count)).min(u128::from(u64::MAX)) as u64;
        Ok(Self {
            partition_bit_count,
            partition_shift,
            partition_max,
            worker_max: worker_count - 1,
            worker_partition_piece,
        })
    }

    pub fn partition_bit_count(&self) -> u32 {
        self.partition_bit_count
    }

    pub fn partition_shift(&self) -> u32 {
        self.partition_shift
    }

    pub fn partition_max(&self) -> u64 {
        self.partition_max
    }

    pub fn worker_max(&self) -> u64 {
        self.worker_max
    }

    pub fn worker_count(&self) -> u64 {
        self.worker_max + 1
    }

    /// Size, in `Key::a` units, of one worker's slice of a partition.
    pub fn worker_partition_piece(&self) -> u64 {
        self.worker_partition_piece
    }

    /// First partition `worker` visits.
    pub fn partition_begin(&self, worker: u64) -> u64 {
        let partitions = u128::from(self.partition_max) + 1;
        (partitions / u128::from(self.worker_count()) * u128::from(worker)) as u64
    }

    /// Partition visited after `partition`, wrapping at the end.
    pub fn next_partition(&self, partition: u64) -> u64 {
        if partition >= self.partition_max {
            0
        } else {
            partition + 1
        }
    }

    /// Lowest key of `partition`.
    pub fn partition_base(&self, partition: u64) -> u64 {
        if self.partition_shift >= 64 {
            0
        } else {
            partition << self.partition_shift
        }
    }

    /// `worker`'s slice of `partition`.
    ///
    /// `None` when the partition has fewer keys than there are workers and
    /// this worker's slice is empty; the last worker then takes the whole
    /// partition.
    pub fn worker_range(&self, partition: u64, worker: u64) -> Option<KeyRange> {
        let base = self.partition_base(partition);
        if worker == self.worker_max {
            let begin = base + self.worker_partition_piece * worker;
            let end = if partition == self.partition_max {
                u64::MAX
            } else {
                ((partition + 1) << self.partition_shift) - 1
            };
            return Some(KeyRange::new(begin, end));
        }
        if self.worker_partition_piece == 0 {
            return None;
        }
        let begin = base + self.worker_partition_piece * worker;
        let end = base + self.worker_partition_piece * (worker + 1) - 1;
        Some(KeyRange::new(begin, end))
    }
}
