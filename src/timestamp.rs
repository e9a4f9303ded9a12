//! Timestamp bits codec
//!
//! Every stored value carries a packed 64-bit field:
//!
//! ```text
//! | microseconds since epoch (56 bits) | flags (8 bits) |
//! ```
//!
//! The low `UTIL_BITS` bits hold status flags. Replication logic only ever
//! compares whole timestamp bits against cutoffs expressed in the same
//! shifted units, so a flag never changes which side of a cutoff a value
//! falls on.

use std::time::Duration;

use chrono::Utc;

/// Number of low-order bits reserved for flags.
pub const UTIL_BITS: u32 = 8;

/// Mask covering every flag bit.
pub const INACTIVE: u64 = 0xff;

/// The record is a tombstone.
pub const DELETION: u64 = 0x80;

/// The record is logically gone locally and must never be replicated.
pub const LOCAL_REMOVAL: u64 = 0x02;

/// The record was rewritten by compaction.
pub const COMPACTION_REWRITE: u64 = 0x01;

/// Decoded form of a timestamp bits value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampBits {
    /// Microseconds since the Unix epoch.
    pub micros: u64,
    /// Whether the record is a tombstone.
    pub is_deletion: bool,
    /// Whether the record has been removed locally.
    pub is_local_removal: bool,
}

impl TimestampBits {
    /// Split a packed value into its timestamp and flags.
    pub fn decode(bits: u64) -> Self {
        Self {
            micros: bits >> UTIL_BITS,
            is_deletion: bits & DELETION != 0,
            is_local_removal: bits & LOCAL_REMOVAL != 0,
        }
    }
}

/// Pack a microsecond timestamp with flags.
///
/// Flags outside `INACTIVE` are discarded.
pub fn encode(micros: u64, flags: u64) -> u64 {
    (micros << UTIL_BITS) | (flags & INACTIVE)
}

/// Current wall-clock time in timestamp bits, with no flags set.
pub fn now_bits() -> u64 {
    let micros = Utc::now().timestamp_micros().max(0) as u64;
    micros << UTIL_BITS
}

/// Convert an age window into shifted timestamp units.
pub fn window_bits(window: Duration) -> u64 {
    let micros = window.as_micros().min(u128::from(u64::MAX >> UTIL_BITS)) as u64;
    micros << UTIL_BITS
}

/// `now - window`, saturating at zero.
pub fn cutoff(now_bits: u64, window_bits: u64) -> u64 {
    now_bits.saturating_sub(window_bits)
}
