//! The allocator contract.
//!
//! [`RawAllocator`] is the minimal capability set generic code needs:
//! allocate, deallocate, and report limits. [`ComposableAllocator`] adds
//! fallible variants so composites such as
//! [`FallbackAllocator`](crate::FallbackAllocator) can ask "can you serve
//! this?" and "is this pointer yours?" without aborting.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::align::MAX_ALIGNMENT;
use crate::error::AllocError;

/// Uniform interface over concrete allocators.
///
/// `allocate` never returns a failure: exhausting the underlying memory
/// source is fatal. Callers that must survive exhaustion use
/// [`ComposableAllocator::try_allocate`].
pub trait RawAllocator {
    /// Allocate `size` bytes aligned to `alignment`.
    ///
    /// `alignment` must be a non-zero power of two no larger than
    /// [`max_alignment`](Self::max_alignment).
    fn allocate(&mut self, size: usize, alignment: usize) -> NonNull<u8>;

    /// Return memory obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this allocator with
    /// the same `size` and `alignment`, and must not have been
    /// deallocated already.
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, size: usize, alignment: usize);

    /// Allocate room for `count` contiguous elements of `size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `count * size` overflows `usize`.
    fn allocate_array(&mut self, count: usize, size: usize, alignment: usize) -> NonNull<u8> {
        match array_size(count, size) {
            Ok(total) => self.allocate(total, alignment),
            Err(err) => panic!("{err}"),
        }
    }

    /// Return memory obtained from [`allocate_array`](Self::allocate_array).
    ///
    /// # Safety
    ///
    /// Same contract as [`deallocate`](Self::deallocate), with the
    /// original `count`, `size` and `alignment`.
    unsafe fn deallocate_array(
        &mut self,
        ptr: NonNull<u8>,
        count: usize,
        size: usize,
        alignment: usize,
    ) {
        // SAFETY: forwarded caller contract; the product did not overflow
        // when the array was allocated.
        unsafe { self.deallocate(ptr, count * size, alignment) }
    }

    /// Largest single allocation this allocator can serve.
    fn max_node_size(&self) -> usize {
        isize::MAX as usize
    }

    /// Largest array allocation (in bytes) this allocator can serve.
    fn max_array_size(&self) -> usize {
        self.max_node_size()
    }

    /// Largest alignment this allocator honours.
    fn max_alignment(&self) -> usize {
        MAX_ALIGNMENT
    }
}

/// An allocator that can report failure instead of aborting and can tell
/// whether it owns a pointer.
pub trait ComposableAllocator: RawAllocator {
    /// Fallible [`RawAllocator::allocate`].
    fn try_allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, AllocError>;

    /// Fallible [`RawAllocator::allocate_array`].
    fn try_allocate_array(
        &mut self,
        count: usize,
        size: usize,
        alignment: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let total = array_size(count, size)?;
        self.try_allocate(total, alignment)
    }

    /// Deallocate `ptr` if it belongs to this allocator.
    ///
    /// Returns `false`, leaving `ptr` untouched, if it does not.
    ///
    /// # Safety
    ///
    /// If `ptr` belongs to this allocator, the contract of
    /// [`RawAllocator::deallocate`] applies.
    unsafe fn try_deallocate(&mut self, ptr: NonNull<u8>, size: usize, alignment: usize) -> bool;

    /// Array form of [`try_deallocate`](Self::try_deallocate).
    ///
    /// # Safety
    ///
    /// Same contract as [`try_deallocate`](Self::try_deallocate).
    unsafe fn try_deallocate_array(
        &mut self,
        ptr: NonNull<u8>,
        count: usize,
        size: usize,
        alignment: usize,
    ) -> bool {
        match count.checked_mul(size) {
            // SAFETY: forwarded caller contract.
            Some(total) => unsafe { self.try_deallocate(ptr, total, alignment) },
            None => false,
        }
    }
}

/// Total byte size of an array request.
pub fn array_size(count: usize, size: usize) -> Result<usize, AllocError> {
    count
        .checked_mul(size)
        .ok_or(AllocError::SizeOverflow { count, size })
}

/// Validate a request against [`Layout`]'s rules.
///
/// Used by allocators that hand requests to the system allocator.
pub fn layout_for(size: usize, alignment: usize) -> Result<Layout, AllocError> {
    Layout::from_size_align(size, alignment).map_err(|_| {
        if alignment.is_power_of_two() {
            AllocError::OutOfMemory { size, alignment }
        } else {
            AllocError::InvalidAlignment { alignment }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_size_detects_overflow() {
        assert_eq!(array_size(4, 8), Ok(32));
        assert_eq!(
            array_size(usize::MAX, 2),
            Err(AllocError::SizeOverflow {
                count: usize::MAX,
                size: 2
            })
        );
    }

    #[test]
    fn layout_for_classifies_errors() {
        assert!(layout_for(64, 8).is_ok());
        assert_eq!(
            layout_for(64, 3),
            Err(AllocError::InvalidAlignment { alignment: 3 })
        );
        assert_eq!(
            layout_for(usize::MAX, 8),
            Err(AllocError::OutOfMemory {
                size: usize::MAX,
                alignment: 8
            })
        );
    }
}
