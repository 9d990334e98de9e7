//! The memory stack.
//!
//! [`MemoryStack`] owns an ordered list of [`Block`]s (oldest first) and
//! bump-allocates from the last one. When the current block is full, a new
//! block sized by the [`GrowthPolicy`] is appended. Memory is released in
//! bulk by unwinding to a [`Marker`] captured earlier with
//! [`MemoryStack::top`]:
//!
//! ```text
//! blocks: [ B0 ][ B1 ][ B2 ]       top = (depth 3, B2.cursor)
//!                ^ marker (depth 2, offset k)
//! unwind(marker) → B2 released, B1 current, B1.cursor = k
//! ```
//!
//! The stack keeps a running count of outstanding bytes (reserved spans,
//! alignment padding included). A non-zero count when the stack is dropped
//! is reported through the process-wide leak handler.

use std::fmt;
use std::ptr::NonNull;

use memstack_core::align::is_valid_alignment;
use memstack_core::error::AllocError;
use memstack_core::leak::report_leak;
use memstack_core::traits::{ComposableAllocator, RawAllocator};
use memstack_core::{AllocatorId, AllocatorInfo, MAX_ALIGNMENT};
use smallvec::SmallVec;

use crate::block::{Allocation, Block};
use crate::config::{BlockRetention, StackConfig, FREED_MEMORY_PATTERN, NEW_MEMORY_PATTERN};
use crate::error::StackError;
use crate::growth::GrowthPolicy;
use crate::guard::UnwindGuard;
use crate::marker::Marker;

/// Allocator kind reported to the leak handler.
const NAME: &str = "memstack::MemoryStack";

/// Stack-discipline arena allocator.
///
/// - `allocate` is O(1) in the common case and never fails for a
///   well-formed request; running out of memory is fatal.
/// - `unwind` releases everything allocated since a marker, in O(k) for
///   the k blocks released.
/// - `deallocate` through [`RawAllocator`] is a no-op.
///
/// The stack is single-owner: it is `Send` but not `Sync`, and all
/// mutation goes through `&mut self`. Pointers it hands out stay valid
/// until an unwind passes them or the stack is dropped.
pub struct MemoryStack {
    /// Active blocks, oldest first. Never empty: block 0 lives as long as
    /// the stack.
    blocks: SmallVec<[Block; 4]>,
    /// Blocks released by unwind, most recently released last.
    cache: Vec<Block>,
    growth: GrowthPolicy,
    retention: BlockRetention,
    debug_fill: bool,
    /// Sum of active block capacities.
    capacity: usize,
    /// Bytes reserved and not yet unwound.
    outstanding: usize,
    next_serial: u64,
    id: AllocatorId,
    /// Position right after construction.
    base: Marker,
}

impl MemoryStack {
    /// Create a stack with the default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(StackConfig::default())
    }

    /// Create a stack from `config`.
    ///
    /// Returns `Err(StackError::InvalidConfig)` if any parameter is out of
    /// range. The initial block is allocated immediately.
    pub fn with_config(config: StackConfig) -> Result<Self, StackError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: StackConfig) -> Self {
        let id = AllocatorId::next();
        let first = Block::new(config.initial_block_size, 0);
        let base = Marker {
            stack: id,
            depth: 1,
            serial: first.serial(),
            offset: 0,
            outstanding: 0,
        };
        let capacity = first.capacity();
        let mut blocks = SmallVec::new();
        blocks.push(first);
        Self {
            blocks,
            cache: Vec::new(),
            growth: config.growth_policy(),
            retention: config.retention,
            debug_fill: config.debug_fill,
            capacity,
            outstanding: 0,
            next_serial: 1,
            id,
            base,
        }
    }

    /// Allocate `size` bytes aligned to `alignment`.
    ///
    /// Bumps the current block if it has room, otherwise appends a block
    /// (reusing a cached one when it fits) and allocates from that.
    /// Alignments above [`MAX_ALIGNMENT`] are honoured at the cost of
    /// extra padding.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be expressed as a block size (its size
    /// plus alignment slack exceeds `isize::MAX`). Exhaustion of the
    /// global allocator aborts via [`std::alloc::handle_alloc_error`].
    pub fn allocate(&mut self, size: usize, alignment: usize) -> NonNull<u8> {
        debug_assert!(
            is_valid_alignment(alignment),
            "invalid alignment {alignment}"
        );
        if let Some(allocation) = self.current_mut().try_allocate(size, alignment) {
            return self.commit(allocation, size);
        }

        let required = match size.checked_add(alignment.saturating_sub(MAX_ALIGNMENT)) {
            Some(required) => required,
            None => panic!("allocation of {size} bytes at alignment {alignment} overflows"),
        };
        self.grow(required);
        // `required` covers the worst-case padding on a MAX_ALIGNMENT base.
        let allocation = self
            .current_mut()
            .try_allocate(size, alignment)
            .expect("fresh block is sized for the request");
        self.commit(allocation, size)
    }

    /// Allocate from the current block only, never growing.
    ///
    /// Returns `None` if the current block lacks room.
    pub fn try_allocate(&mut self, size: usize, alignment: usize) -> Option<NonNull<u8>> {
        debug_assert!(
            is_valid_alignment(alignment),
            "invalid alignment {alignment}"
        );
        let allocation = self.current_mut().try_allocate(size, alignment)?;
        Some(self.commit(allocation, size))
    }

    /// Current allocation position. O(1), no side effects.
    pub fn top(&self) -> Marker {
        let current = self.current();
        Marker {
            stack: self.id,
            depth: self.blocks.len(),
            serial: current.serial(),
            offset: current.used(),
            outstanding: self.outstanding,
        }
    }

    /// Release everything allocated since `marker` was captured.
    ///
    /// Blocks appended after the marker's block are released (cached or
    /// freed according to [`BlockRetention`]); the marker's block becomes
    /// current again with its cursor restored.
    ///
    /// `marker` must come from [`top`](Self::top) on this stack and must
    /// not lie ahead of the current position or inside a block an earlier
    /// unwind already released. Debug builds assert this; release builds
    /// clamp to the nearest valid position.
    pub fn unwind(&mut self, marker: Marker) {
        self.check_marker(&marker);

        let depth = marker.depth.clamp(1, self.blocks.len());
        let released = self.blocks.len() - depth;
        while self.blocks.len() > depth {
            if let Some(block) = self.blocks.pop() {
                self.release_block(block);
            }
        }
        if released > 0 {
            tracing::trace!(
                stack = self.id.get(),
                released,
                remaining = self.blocks.len(),
                "unwound across block boundary"
            );
        }

        let debug_fill = self.debug_fill;
        let current = self.current_mut();
        let offset = marker.offset.min(current.used());
        if debug_fill {
            let used = current.used();
            current.fill(offset, used - offset, FREED_MEMORY_PATTERN);
        }
        current.rewind(offset);
        self.outstanding = marker.outstanding.min(self.outstanding);
    }

    /// Release everything allocated through this stack so far.
    pub fn unwind_all(&mut self) {
        self.unwind(self.base);
    }

    /// Start a scope whose allocations are unwound when the returned guard
    /// is dropped.
    pub fn guard(&mut self) -> UnwindGuard<'_> {
        UnwindGuard::new(self)
    }

    /// Report outstanding allocations to the leak handler.
    ///
    /// Invokes the handler only if the count is non-zero. Returns the count.
    pub fn report_leaks(&self) -> usize {
        if self.outstanding != 0 {
            report_leak(self.info(), self.outstanding);
        }
        self.outstanding
    }

    /// Free every cached block.
    pub fn shrink_to_fit(&mut self) {
        if !self.cache.is_empty() {
            tracing::trace!(
                stack = self.id.get(),
                freed = self.cache.len(),
                "released cached blocks"
            );
        }
        self.cache = Vec::new();
    }

    /// Bytes reserved and not yet unwound, alignment padding included.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Number of active blocks (always at least one).
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of released blocks held for reuse.
    pub fn cached_block_count(&self) -> usize {
        self.cache.len()
    }

    /// Total capacity of the active blocks in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes left in the current block.
    pub fn capacity_left(&self) -> usize {
        self.current().remaining()
    }

    /// Capacity the growth policy would give the next fresh block.
    pub fn next_capacity(&self) -> usize {
        self.growth.next_capacity(self.capacity, 0)
    }

    /// The growth policy in use.
    pub fn growth_policy(&self) -> &GrowthPolicy {
        &self.growth
    }

    /// Whether `ptr` points into one of the active blocks, or at the end
    /// of one (where a zero-size request on a full block lands).
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.blocks.iter().any(|block| block.contains(ptr))
    }

    /// Identity reported to the leak handler.
    pub fn info(&self) -> AllocatorInfo {
        AllocatorInfo::new(NAME, self.id)
    }

    fn current(&self) -> &Block {
        self.blocks.last().expect("stack always owns its first block")
    }

    fn current_mut(&mut self) -> &mut Block {
        self.blocks
            .last_mut()
            .expect("stack always owns its first block")
    }

    fn commit(&mut self, allocation: Allocation, size: usize) -> NonNull<u8> {
        self.outstanding += allocation.reserved;
        if self.debug_fill {
            let current = self.current_mut();
            let start = current.used() - size;
            current.fill(start, size, NEW_MEMORY_PATTERN);
        }
        allocation.ptr
    }

    /// Append a block that can hold `required` bytes at a
    /// [`MAX_ALIGNMENT`] boundary.
    fn grow(&mut self, required: usize) {
        let serial = self.next_serial;
        self.next_serial += 1;

        let block = match self.take_cached(required) {
            Some(mut block) => {
                block.recycle(serial);
                block
            }
            None => {
                let capacity = self.growth.next_capacity(self.capacity, required);
                tracing::debug!(
                    stack = self.id.get(),
                    capacity,
                    total = self.capacity,
                    required,
                    "allocating new block"
                );
                Block::new(capacity, serial)
            }
        };
        self.capacity += block.capacity();
        self.blocks.push(block);
    }

    /// Most recently released cached block with at least `required` bytes.
    fn take_cached(&mut self, required: usize) -> Option<Block> {
        let index = self
            .cache
            .iter()
            .rposition(|block| block.capacity() >= required)?;
        Some(self.cache.remove(index))
    }

    fn release_block(&mut self, mut block: Block) {
        self.capacity -= block.capacity();
        if self.debug_fill {
            let used = block.used();
            block.fill(0, used, FREED_MEMORY_PATTERN);
        }
        match self.retention {
            BlockRetention::Cache => self.cache.push(block),
            BlockRetention::Release => drop(block),
        }
    }

    /// Debug-build validation of an unwind target.
    fn check_marker(&self, marker: &Marker) {
        debug_assert_eq!(
            marker.stack, self.id,
            "marker belongs to a different stack"
        );
        debug_assert!(
            marker.depth >= 1 && marker.depth <= self.blocks.len(),
            "marker refers to a released block (depth {}, {} active)",
            marker.depth,
            self.blocks.len()
        );
        if let Some(block) = marker.depth.checked_sub(1).and_then(|i| self.blocks.get(i)) {
            debug_assert_eq!(
                marker.serial,
                block.serial(),
                "marker refers to a released block"
            );
            debug_assert!(
                marker.offset <= block.used(),
                "cannot unwind forward ({} > {})",
                marker.offset,
                block.used()
            );
        }
        debug_assert!(
            marker.outstanding <= self.outstanding,
            "cannot unwind forward ({} outstanding > {})",
            marker.outstanding,
            self.outstanding
        );
    }
}

impl Default for MemoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryStack {
    fn drop(&mut self) {
        self.report_leaks();
    }
}

impl fmt::Debug for MemoryStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStack")
            .field("id", &self.id)
            .field("blocks", &self.blocks.as_slice())
            .field("cached", &self.cache.len())
            .field("capacity", &self.capacity)
            .field("outstanding", &self.outstanding)
            .finish()
    }
}

// Implementing the trait's `unsafe fn`s is the only unsafe surface here.
#[allow(unsafe_code)]
impl RawAllocator for MemoryStack {
    fn allocate(&mut self, size: usize, alignment: usize) -> NonNull<u8> {
        MemoryStack::allocate(self, size, alignment)
    }

    /// No-op: stack memory is released by [`MemoryStack::unwind`].
    unsafe fn deallocate(&mut self, _ptr: NonNull<u8>, _size: usize, _alignment: usize) {}
}

#[allow(unsafe_code)]
impl ComposableAllocator for MemoryStack {
    /// Allocate from the current block without growing.
    fn try_allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, AllocError> {
        if !is_valid_alignment(alignment) {
            return Err(AllocError::InvalidAlignment { alignment });
        }
        MemoryStack::try_allocate(self, size, alignment).ok_or(AllocError::Exhausted {
            requested: size,
            available: self.capacity_left(),
        })
    }

    /// Accepts (and ignores) any pointer [`owns`](MemoryStack::owns) accepts.
    unsafe fn try_deallocate(&mut self, ptr: NonNull<u8>, _size: usize, _alignment: usize) -> bool {
        self.owns(ptr.as_ptr())
    }
}
