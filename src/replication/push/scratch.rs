//! Per-worker scratch buffers
//!
//! Each worker gathers candidate keys into a list and reads values into a
//! buffer. Both are allocated the first time a worker index is used and kept
//! for every later pass, so steady-state passes do not allocate.
//!
//! During a pass a worker owns its `WorkerScratch` outright: the pool hands
//! it out with `take` and receives it back with `restore`.

use std::mem;

use crate::locmap::Key;

/// Buffers owned by one worker for the duration of a pass.
#[derive(Debug, Default)]
pub struct WorkerScratch {
    pub keys: Vec<Key>,
    pub value: Vec<u8>,
}

impl WorkerScratch {
    pub fn with_capacity(keys: usize, value: usize) -> Self {
        Self {
            keys: Vec::with_capacity(keys),
            value: Vec::with_capacity(value),
        }
    }
}

/// Scratch buffers indexed by worker ordinal.
#[derive(Debug, Default)]
pub struct ScratchPool {
    slots: Vec<WorkerScratch>,
}

impl ScratchPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow to at least `workers` slots. Never shrinks; existing buffers
    /// are kept.
    pub fn grow(&mut self, workers: usize, key_capacity: usize, value_capacity: usize) {
        while self.slots.len() < workers {
            self.slots
                .push(WorkerScratch::with_capacity(key_capacity, value_capacity));
        }
    }

    /// Hand slot `worker` to its worker, leaving an empty placeholder.
    pub fn take(&mut self, worker: usize) -> WorkerScratch {
        mem::take(&mut self.slots[worker])
    }

    /// Return a worker's buffers to its slot.
    pub fn restore(&mut self, worker: usize, scratch: WorkerScratch) {
        self.slots[worker] = scratch;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every buffer.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
