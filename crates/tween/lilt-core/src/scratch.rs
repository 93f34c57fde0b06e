//! Reusable buffers for tree walks and bulk operations.
//!
//! Buffers keep their capacity between uses so steady-state stepping does
//! not allocate.

use crate::ids::TaskHandle;

#[derive(Debug, Default)]
pub struct Scratch {
    /// Depth-first stack of arena indices.
    pub stack: Vec<u32>,
    /// Handles collected by bulk operations before they act.
    pub handles: Vec<TaskHandle>,
}

impl Scratch {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            stack: Vec::with_capacity(cap),
            handles: Vec::with_capacity(cap),
        }
    }

    /// Take the handle buffer, leaving an empty one behind. Pair with
    /// [`Scratch::restore_handles`] so the allocation is kept.
    pub fn take_handles(&mut self) -> Vec<TaskHandle> {
        let mut v = std::mem::take(&mut self.handles);
        v.clear();
        v
    }

    pub fn restore_handles(&mut self, mut v: Vec<TaskHandle>) {
        v.clear();
        if v.capacity() >= self.handles.capacity() {
            self.handles = v;
        }
    }

    pub fn take_stack(&mut self) -> Vec<u32> {
        let mut v = std::mem::take(&mut self.stack);
        v.clear();
        v
    }

    pub fn restore_stack(&mut self, mut v: Vec<u32>) {
        v.clear();
        if v.capacity() >= self.stack.capacity() {
            self.stack = v;
        }
    }
}
