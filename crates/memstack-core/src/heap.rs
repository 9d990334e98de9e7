//! System-heap allocator.
//!
//! [`HeapAllocator`] forwards to `std::alloc`. It is the natural last link
//! of a fallback chain: it accepts every deallocation handed to it.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::AllocError;
use crate::traits::{layout_for, ComposableAllocator, RawAllocator};

/// Stateless allocator backed by the global allocator.
///
/// Zero-sized requests are rounded up to one byte so every returned
/// pointer is a real, distinct allocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapAllocator;

impl HeapAllocator {
    fn layout(size: usize, alignment: usize) -> Result<Layout, AllocError> {
        layout_for(size.max(1), alignment)
    }
}

impl RawAllocator for HeapAllocator {
    fn allocate(&mut self, size: usize, alignment: usize) -> NonNull<u8> {
        let layout = match Self::layout(size, alignment) {
            Ok(layout) => layout,
            Err(err) => panic!("heap allocation rejected: {err}"),
        };
        // SAFETY: `layout` has non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(layout))
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, size: usize, alignment: usize) {
        let layout = Self::layout(size, alignment);
        debug_assert!(
            layout.is_ok(),
            "heap deallocation with mismatched layout (size {size}, alignment {alignment})"
        );
        if let Ok(layout) = layout {
            // SAFETY: caller guarantees `ptr` came from `allocate` with this
            // size and alignment, hence with this layout.
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
        }
    }
}

impl ComposableAllocator for HeapAllocator {
    fn try_allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, AllocError> {
        let layout = Self::layout(size, alignment)?;
        // SAFETY: `layout` has non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::OutOfMemory { size, alignment })
    }

    unsafe fn try_deallocate(&mut self, ptr: NonNull<u8>, size: usize, alignment: usize) -> bool {
        // SAFETY: forwarded caller contract.
        unsafe { self.deallocate(ptr, size, alignment) };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::is_aligned;

    #[test]
    fn allocate_respects_alignment() {
        let mut heap = HeapAllocator;
        for shift in 0..8 {
            let alignment = 1 << shift;
            let ptr = heap.allocate(24, alignment);
            assert!(is_aligned(ptr.as_ptr(), alignment));
            unsafe { heap.deallocate(ptr, 24, alignment) };
        }
    }

    #[test]
    fn try_allocate_rejects_bad_alignment() {
        let mut heap = HeapAllocator;
        assert_eq!(
            heap.try_allocate(8, 3),
            Err(AllocError::InvalidAlignment { alignment: 3 })
        );
    }

    #[test]
    fn array_roundtrip_is_writable() {
        let mut heap = HeapAllocator;
        let ptr = heap.try_allocate_array(16, 4, 4).unwrap();
        let words = ptr.cast::<u32>().as_ptr();
        unsafe {
            for i in 0..16 {
                words.add(i).write(i as u32);
            }
            assert_eq!(words.add(15).read(), 15);
            assert!(heap.try_deallocate_array(ptr, 16, 4, 4));
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "mismatched layout")]
    fn deallocate_with_invalid_layout_is_caught_in_debug() {
        let mut heap = HeapAllocator;
        let mut byte = 0u8;
        unsafe { heap.deallocate(NonNull::from(&mut byte), 1, 3) };
    }

    #[test]
    fn try_allocate_array_overflow() {
        let mut heap = HeapAllocator;
        assert!(matches!(
            heap.try_allocate_array(usize::MAX, 8, 8),
            Err(AllocError::SizeOverflow { .. })
        ));
    }
}
