//! Stack position markers.

use std::cmp::Ordering;

use memstack_core::AllocatorId;

/// Opaque allocation position within one [`MemoryStack`](crate::MemoryStack).
///
/// Produced by [`MemoryStack::top`](crate::MemoryStack::top) and consumed by
/// [`MemoryStack::unwind`](crate::MemoryStack::unwind). A marker is only
/// meaningful for the stack that produced it and only for unwinding
/// backward in time.
///
/// Markers of the same stack compare by position: a later position is
/// greater. Markers of different stacks, or of a block that has since
/// been released and replaced, are incomparable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Marker {
    /// Stack that produced this marker.
    pub(crate) stack: AllocatorId,
    /// Number of active blocks at capture time (the current block is
    /// `depth - 1`).
    pub(crate) depth: usize,
    /// Serial of the current block at capture time.
    pub(crate) serial: u64,
    /// Cursor of the current block at capture time.
    pub(crate) offset: usize,
    /// Outstanding bytes at capture time.
    pub(crate) outstanding: usize,
}

impl PartialOrd for Marker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.stack != other.stack {
            return None;
        }
        match self.depth.cmp(&other.depth) {
            // Same depth but a different block means one of the two was
            // captured in a timeline that has been unwound.
            Ordering::Equal if self.serial != other.serial => None,
            Ordering::Equal => Some(self.offset.cmp(&other.offset)),
            ord => Some(ord),
        }
    }
}
