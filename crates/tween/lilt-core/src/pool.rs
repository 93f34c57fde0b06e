//! Slot arena with a freelist, plus the per-phase staged/live buffers.

use serde::Serialize;

use crate::task::TaskSlot;

/// Snapshot of pool occupancy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub allocated: usize,
    pub free: usize,
}

pub(crate) struct Pool {
    pub slots: Vec<TaskSlot>,
    free: Vec<u32>,
    capacity: usize,
}

/// Result of [`Pool::fetch`]: the slot index and, if the pool had to grow,
/// the old and new capacity.
pub(crate) struct Fetched {
    pub index: u32,
    pub grew: Option<(usize, usize)>,
}

impl Pool {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut pool = Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            capacity: 0,
        };
        pool.prefill(capacity);
        pool
    }

    /// Grow to at least `n` vacant-or-used slots. Never shrinks.
    pub fn prefill(&mut self, n: usize) {
        let old = self.slots.len();
        if n <= old {
            self.capacity = self.capacity.max(n);
            return;
        }
        self.slots.reserve(n - old);
        self.slots.extend((old..n).map(|_| TaskSlot::vacant()));
        // lowest index pops first
        self.free.extend((old..n).rev().map(|i| i as u32));
        self.capacity = self.capacity.max(n);
    }

    pub fn fetch(&mut self) -> Fetched {
        if let Some(index) = self.free.pop() {
            return Fetched { index, grew: None };
        }
        let mut grew = None;
        if self.slots.len() >= self.capacity {
            let from = self.capacity;
            let to = (from * 2).max(1);
            self.slots.reserve(to - self.slots.len());
            self.capacity = to;
            grew = Some((from, to));
        }
        let index = self.slots.len() as u32;
        self.slots.push(TaskSlot::vacant());
        Fetched { index, grew }
    }

    /// Reset the slot and hand it back to the freelist.
    pub fn release(&mut self, index: u32) {
        self.slots[index as usize] = TaskSlot::vacant();
        self.free.push(index);
    }

    #[inline]
    pub fn get(&self, index: u32) -> &TaskSlot {
        &self.slots[index as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, index: u32) -> &mut TaskSlot {
        &mut self.slots[index as usize]
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            allocated: self.slots.len(),
            free: self.free.len(),
        }
    }
}

/// Staged and live buffers for one phase.
#[derive(Debug, Default)]
pub(crate) struct PhaseBucket {
    pub live: Vec<u32>,
    pub staged: Vec<u32>,
    /// Nonzero while `live` is being iterated.
    pub lock: u32,
}

impl PhaseBucket {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            live: Vec::with_capacity(cap),
            staged: Vec::with_capacity(cap),
            lock: 0,
        }
    }

    pub fn stage(&mut self, index: u32) {
        self.staged.push(index);
    }

    /// Move staged tasks into the live buffer. Tasks killed before they were
    /// ever stepped go straight back to the pool.
    pub fn promote(&mut self, pool: &mut Pool) {
        if self.lock > 0 {
            return;
        }
        for index in self.staged.drain(..) {
            if pool.get(index).alive {
                self.live.push(index);
            } else {
                pool.release(index);
            }
        }
    }

    /// Drop dead entries, keeping the survivors' relative order.
    pub fn compact(&mut self, pool: &mut Pool) {
        if self.lock > 0 {
            return;
        }
        let mut write = 0usize;
        for read in 0..self.live.len() {
            let index = self.live[read];
            if pool.get(index).alive {
                self.live[write] = index;
                write += 1;
            } else {
                pool.release(index);
            }
        }
        self.live.truncate(write);
    }
}
