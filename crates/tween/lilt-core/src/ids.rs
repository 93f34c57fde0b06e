//! Identifiers, handles and the monotonic id allocator.

use serde::{Deserialize, Serialize};

/// Unique identity of one task incarnation. Slot reuse always yields a new id.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Sentinel stored in vacant (pooled) slots.
    pub const NONE: TaskId = TaskId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// External reference to a task: arena index plus the id it was issued for.
///
/// A handle stays cheap to copy and becomes inert once its slot is recycled,
/// since the slot's id no longer matches.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    pub(crate) index: u32,
    pub(crate) id: TaskId,
}

impl TaskHandle {
    pub(crate) fn new(index: u32, id: TaskId) -> Self {
        Self { index, id }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }
}

/// Handle to a task of kind sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SequenceHandle(pub(crate) TaskHandle);

impl SequenceHandle {
    #[inline]
    pub fn task(&self) -> TaskHandle {
        self.0
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.0.id
    }
}

impl From<SequenceHandle> for TaskHandle {
    fn from(seq: SequenceHandle) -> Self {
        seq.0
    }
}

/// Monotonic allocator for task ids. Starts at 1 so that 0 stays the sentinel.
#[derive(Debug)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1).max(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic_and_never_none() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc(), TaskId(1));
        assert_eq!(alloc.alloc(), TaskId(2));
        assert!(!alloc.alloc().is_none());
    }

    #[test]
    fn wraps_past_the_sentinel() {
        let mut alloc = IdAllocator { next: u64::MAX };
        assert_eq!(alloc.alloc(), TaskId(u64::MAX));
        assert_eq!(alloc.alloc(), TaskId(1));
    }
}
