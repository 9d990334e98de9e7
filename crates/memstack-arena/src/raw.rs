//! Low-level primitives for block memory.
//!
//! Every `unsafe` operation in this crate lives here, each with a
//! `// SAFETY:` comment. The rest of the crate works in offsets and
//! `NonNull` pointers obtained through [`RawBlock`].

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use memstack_core::MAX_ALIGNMENT;

/// Owned, uninitialised heap region aligned to [`MAX_ALIGNMENT`].
///
/// Released on drop. The region never moves for the lifetime of the value,
/// so pointers derived from it stay valid while the `RawBlock` is alive.
pub(crate) struct RawBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: `RawBlock` uniquely owns its region; nothing else holds the
// pointer, so moving ownership to another thread is sound.
unsafe impl Send for RawBlock {}

impl RawBlock {
    /// Allocate `capacity` bytes.
    ///
    /// Aborts through [`alloc::handle_alloc_error`] if the global allocator
    /// fails. Panics if `capacity` is zero or exceeds `isize::MAX` once
    /// rounded to [`MAX_ALIGNMENT`].
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "block capacity must be non-zero");
        let layout = match Layout::from_size_align(capacity, MAX_ALIGNMENT) {
            Ok(layout) => layout,
            Err(_) => panic!("block capacity {capacity} exceeds the address space"),
        };
        // SAFETY: `layout` has non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Self { ptr, layout }
    }

    /// Size of the region in bytes.
    pub(crate) fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Address of the first byte.
    pub(crate) fn base_addr(&self) -> usize {
        self.ptr.as_ptr().addr()
    }

    /// Pointer to the byte at `offset`.
    pub(crate) fn at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset <= self.capacity(), "offset {offset} out of bounds");
        // SAFETY: `offset <= capacity`, so the result stays within (or one
        // past the end of) the allocation and cannot be null.
        unsafe { self.ptr.add(offset) }
    }

    /// Overwrite `[offset, offset + len)` with `byte`.
    pub(crate) fn fill(&mut self, offset: usize, len: usize, byte: u8) {
        let end = offset.checked_add(len);
        assert!(
            matches!(end, Some(end) if end <= self.capacity()),
            "fill range {offset}+{len} out of bounds"
        );
        // SAFETY: the range was checked against the capacity above, and
        // `&mut self` guarantees no live shared borrow of the region is
        // handed out through this type.
        unsafe { self.ptr.add(offset).as_ptr().write_bytes(byte, len) }
    }
}

impl Drop for RawBlock {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `alloc::alloc` with `layout` and is
        // freed exactly once.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memstack_core::is_aligned;

    #[test]
    fn base_is_max_aligned() {
        let raw = RawBlock::new(100);
        assert_eq!(raw.capacity(), 100);
        assert!(is_aligned(raw.at(0).as_ptr(), MAX_ALIGNMENT));
    }

    #[test]
    fn fill_writes_pattern() {
        let mut raw = RawBlock::new(32);
        raw.fill(0, 32, 0xAB);
        raw.fill(8, 4, 0x11);
        let byte = |off: usize| unsafe { raw.at(off).as_ptr().read() };
        assert_eq!(byte(0), 0xAB);
        assert_eq!(byte(8), 0x11);
        assert_eq!(byte(11), 0x11);
        assert_eq!(byte(12), 0xAB);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn fill_past_end_panics() {
        let mut raw = RawBlock::new(16);
        raw.fill(10, 8, 0);
    }
}
