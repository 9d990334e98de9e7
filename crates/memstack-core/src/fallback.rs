//! "Try this allocator, fall back to that one."

#![allow(unsafe_code)]

use std::ptr::NonNull;

use crate::error::AllocError;
use crate::traits::{ComposableAllocator, RawAllocator};

/// Composite allocator that serves requests from `D` when it can and
/// from `F` otherwise.
///
/// `D` must be composable: allocation uses `D::try_allocate` and
/// deallocation asks `D::try_deallocate` whether the pointer is its own
/// before handing it to `F`. The composite is itself composable when `F`
/// is, so chains nest.
#[derive(Debug, Default)]
pub struct FallbackAllocator<D, F> {
    default: D,
    fallback: F,
}

impl<D, F> FallbackAllocator<D, F>
where
    D: ComposableAllocator,
    F: RawAllocator,
{
    /// Combine a primary allocator with a fallback.
    pub fn new(default: D, fallback: F) -> Self {
        Self { default, fallback }
    }

    /// The primary allocator.
    pub fn default_allocator(&self) -> &D {
        &self.default
    }

    /// Mutable access to the primary allocator.
    pub fn default_allocator_mut(&mut self) -> &mut D {
        &mut self.default
    }

    /// The fallback allocator.
    pub fn fallback_allocator(&self) -> &F {
        &self.fallback
    }

    /// Mutable access to the fallback allocator.
    pub fn fallback_allocator_mut(&mut self) -> &mut F {
        &mut self.fallback
    }

    /// Split back into the two allocators.
    pub fn into_parts(self) -> (D, F) {
        (self.default, self.fallback)
    }
}

impl<D, F> RawAllocator for FallbackAllocator<D, F>
where
    D: ComposableAllocator,
    F: RawAllocator,
{
    fn allocate(&mut self, size: usize, alignment: usize) -> NonNull<u8> {
        match self.default.try_allocate(size, alignment) {
            Ok(ptr) => ptr,
            Err(_) => self.fallback.allocate(size, alignment),
        }
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, size: usize, alignment: usize) {
        // SAFETY: forwarded caller contract; exactly one of the two
        // allocators handed out `ptr`.
        unsafe {
            if !self.default.try_deallocate(ptr, size, alignment) {
                self.fallback.deallocate(ptr, size, alignment);
            }
        }
    }

    fn allocate_array(&mut self, count: usize, size: usize, alignment: usize) -> NonNull<u8> {
        match self.default.try_allocate_array(count, size, alignment) {
            Ok(ptr) => ptr,
            Err(_) => self.fallback.allocate_array(count, size, alignment),
        }
    }

    unsafe fn deallocate_array(
        &mut self,
        ptr: NonNull<u8>,
        count: usize,
        size: usize,
        alignment: usize,
    ) {
        // SAFETY: as for `deallocate`.
        unsafe {
            if !self.default.try_deallocate_array(ptr, count, size, alignment) {
                self.fallback.deallocate_array(ptr, count, size, alignment);
            }
        }
    }

    fn max_node_size(&self) -> usize {
        self.default.max_node_size().max(self.fallback.max_node_size())
    }

    fn max_array_size(&self) -> usize {
        self.default
            .max_array_size()
            .max(self.fallback.max_array_size())
    }

    fn max_alignment(&self) -> usize {
        self.default.max_alignment().max(self.fallback.max_alignment())
    }
}

impl<D, F> ComposableAllocator for FallbackAllocator<D, F>
where
    D: ComposableAllocator,
    F: ComposableAllocator,
{
    fn try_allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, AllocError> {
        self.default
            .try_allocate(size, alignment)
            .or_else(|_| self.fallback.try_allocate(size, alignment))
    }

    fn try_allocate_array(
        &mut self,
        count: usize,
        size: usize,
        alignment: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        self.default
            .try_allocate_array(count, size, alignment)
            .or_else(|_| self.fallback.try_allocate_array(count, size, alignment))
    }

    unsafe fn try_deallocate(&mut self, ptr: NonNull<u8>, size: usize, alignment: usize) -> bool {
        // SAFETY: forwarded caller contract.
        unsafe {
            self.default.try_deallocate(ptr, size, alignment)
                || self.fallback.try_deallocate(ptr, size, alignment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::HeapAllocator;

    /// Serves up to 64 bytes from a fixed buffer, ignoring alignment.
    struct Budget {
        buf: Box<[u8; 64]>,
        used: usize,
    }

    impl Budget {
        fn new() -> Self {
            Self {
                buf: Box::new([0; 64]),
                used: 0,
            }
        }

        fn owns(&self, ptr: NonNull<u8>) -> bool {
            let start = self.buf.as_ptr().addr();
            (start..start + 64).contains(&ptr.as_ptr().addr())
        }
    }

    impl RawAllocator for Budget {
        fn allocate(&mut self, size: usize, alignment: usize) -> NonNull<u8> {
            match self.try_allocate(size, alignment) {
                Ok(ptr) => ptr,
                Err(err) => panic!("{err}"),
            }
        }

        unsafe fn deallocate(&mut self, _ptr: NonNull<u8>, _size: usize, _alignment: usize) {}

        fn max_node_size(&self) -> usize {
            64
        }

        fn max_alignment(&self) -> usize {
            1
        }
    }

    impl ComposableAllocator for Budget {
        fn try_allocate(&mut self, size: usize, _alignment: usize) -> Result<NonNull<u8>, AllocError> {
            if self.used + size > 64 {
                return Err(AllocError::Exhausted {
                    requested: size,
                    available: 64 - self.used,
                });
            }
            let ptr = NonNull::from(&mut self.buf[self.used]);
            self.used += size;
            Ok(ptr)
        }

        unsafe fn try_deallocate(&mut self, ptr: NonNull<u8>, _size: usize, _alignment: usize) -> bool {
            self.owns(ptr)
        }
    }

    #[test]
    fn serves_from_default_until_exhausted() {
        let mut alloc = FallbackAllocator::new(Budget::new(), HeapAllocator);
        let a = alloc.allocate(40, 1);
        assert!(alloc.default_allocator().owns(a));

        let b = alloc.allocate(40, 1);
        assert!(!alloc.default_allocator().owns(b));

        unsafe {
            alloc.deallocate(b, 40, 1);
            alloc.deallocate(a, 40, 1);
        }
    }

    #[test]
    fn try_deallocate_reports_ownership_through_chain() {
        let mut alloc = FallbackAllocator::new(Budget::new(), HeapAllocator);
        let ptr = alloc.try_allocate(80, 8).unwrap();
        assert!(unsafe { alloc.try_deallocate(ptr, 80, 8) });
    }

    #[test]
    fn limits_take_the_larger_side() {
        let alloc = FallbackAllocator::new(Budget::new(), HeapAllocator);
        assert_eq!(alloc.default_allocator().max_node_size(), 64);
        assert_eq!(alloc.max_node_size(), isize::MAX as usize);
        assert_eq!(alloc.max_alignment(), crate::MAX_ALIGNMENT);
    }
}
