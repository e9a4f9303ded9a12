//! Bulk-set messages
//!
//! A bulk-set message carries a batch of key/timestamp/value entries to
//! another node in one transport unit. Layout (big endian):
//!
//! ```text
//! header: responder node id (8)
//! entry:  key a (8) | key b (8) | timestamp bits (8) | length (4) | value
//! ```
//!
//! The message is bounded by a byte cap fixed at construction. An entry that
//! does not fit is rejected whole; entries are never split.

use crate::locmap::Key;

/// Transport message type for bulk-set messages.
pub const BULK_SET_MSG_TYPE: u64 = 0x44f5_8445_991a_4aa1;

/// Bytes of message header.
pub const MSG_HEADER_LENGTH: usize = 8;

/// Bytes of per-entry header preceding the value.
pub const ENTRY_HEADER_LENGTH: usize = 28;

/// Smallest possible entry (empty value).
pub const MIN_ENTRY_LENGTH: usize = ENTRY_HEADER_LENGTH;

/// An outgoing batch of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSetMessage {
    cap: usize,
    buffer: Vec<u8>,
    entry_count: usize,
}

impl BulkSetMessage {
    /// Create an empty message holding at most `cap` bytes including the
    /// header.
    pub fn new(cap: usize, responder_id: u64) -> Self {
        let mut buffer = Vec::with_capacity(cap.min(64 * 1024));
        buffer.extend_from_slice(&responder_id.to_be_bytes());
        Self {
            cap,
            buffer,
            entry_count: 0,
        }
    }

    /// Append an entry. Returns false, leaving the message unchanged, if the
    /// entry would push the message past its cap.
    pub fn add(&mut self, key: Key, timestamp_bits: u64, value: &[u8]) -> bool {
        let entry_length = ENTRY_HEADER_LENGTH + value.len();
        if value.len() > u32::MAX as usize || self.buffer.len() + entry_length > self.cap {
            return false;
        }
        self.buffer.extend_from_slice(&key.a.to_be_bytes());
        self.buffer.extend_from_slice(&key.b.to_be_bytes());
        self.buffer.extend_from_slice(&timestamp_bits.to_be_bytes());
        self.buffer.extend_from_slice(&(value.len() as u32).to_be_bytes());
        self.buffer.extend_from_slice(value);
        self.entry_count += 1;
        true
    }

    pub fn msg_type(&self) -> u64 {
        BULK_SET_MSG_TYPE
    }

    pub fn responder_id(&self) -> u64 {
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.buffer[..MSG_HEADER_LENGTH]);
        u64::from_be_bytes(id)
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Encoded length in bytes, header included.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Decode the entries back out of the message.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            remaining: &self.buffer[MSG_HEADER_LENGTH..],
        }
    }
}

/// A decoded bulk-set entry borrowing its value from the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkSetEntry<'a> {
    pub key: Key,
    pub timestamp_bits: u64,
    pub value: &'a [u8],
}

/// Iterator over the entries of a `BulkSetMessage`.
pub struct Entries<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for Entries<'a> {
    type Item = BulkSetEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.len() < ENTRY_HEADER_LENGTH {
            return None;
        }
        let (header, rest) = self.remaining.split_at(ENTRY_HEADER_LENGTH);
        let a = u64::from_be_bytes(header[0..8].try_into().ok()?);
        let b = u64::from_be_bytes(header[8..16].try_into().ok()?);
        let timestamp_bits = u64::from_be_bytes(header[16..24].try_into().ok()?);
        let length = u32::from_be_bytes(header[24..28].try_into().ok()?) as usize;
        if rest.len() < length {
            return None;
        }
        let (value, rest) = rest.split_at(length);
        self.remaining = rest;
        Some(BulkSetEntry {
            key: Key::new(a, b),
            timestamp_bits,
            value,
        })
    }
}
