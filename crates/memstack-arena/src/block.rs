//! Contiguous memory blocks with bump allocation.
//!
//! A [`Block`] is a fixed-capacity region with a cursor that advances on
//! each allocation. Blocks are the unit the memory stack grows by; they
//! never resize, and their memory is only released when the block itself
//! is dropped.

use std::ptr::NonNull;

use memstack_core::align::{align_offset, is_valid_alignment};

use crate::raw::RawBlock;

/// Result of a successful bump allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Start of the usable region.
    pub ptr: NonNull<u8>,
    /// Bytes consumed from the block: alignment padding plus the size.
    pub reserved: usize,
}

/// A single contiguous memory region with a bump cursor.
pub struct Block {
    memory: RawBlock,
    /// Next free byte, as an offset from the block base.
    cursor: usize,
    /// Identity within the owning stack; never reused by that stack.
    serial: u64,
}

impl Block {
    /// Allocate a new block of `capacity` bytes.
    ///
    /// The block base is aligned to [`MAX_ALIGNMENT`](memstack_core::MAX_ALIGNMENT).
    /// Out of memory is fatal.
    pub fn new(capacity: usize, serial: u64) -> Self {
        Self {
            memory: RawBlock::new(capacity),
            cursor: 0,
            serial,
        }
    }

    /// Bump-allocate `size` bytes at `alignment`.
    ///
    /// Returns `None` if the remaining capacity, after alignment padding,
    /// cannot hold `size` bytes. The cursor is untouched on failure.
    pub fn try_allocate(&mut self, size: usize, alignment: usize) -> Option<Allocation> {
        let reserved = self.span_for(size, alignment)?;
        let ptr = self.memory.at(self.cursor + reserved - size);
        self.cursor += reserved;
        Some(Allocation { ptr, reserved })
    }

    /// Bytes a request of `size` at `alignment` would consume at the
    /// current cursor, or `None` if it does not fit.
    pub fn span_for(&self, size: usize, alignment: usize) -> Option<usize> {
        debug_assert!(
            is_valid_alignment(alignment),
            "invalid alignment {alignment}"
        );
        let padding = align_offset(self.memory.base_addr() + self.cursor, alignment);
        let reserved = padding.checked_add(size)?;
        (reserved <= self.remaining()).then_some(reserved)
    }

    /// Move the cursor back to the start without releasing memory.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Reset the cursor and take a new identity, for reuse after release.
    pub(crate) fn recycle(&mut self, serial: u64) {
        self.reset();
        self.serial = serial;
    }

    /// Move the cursor back to `offset`.
    ///
    /// Rewinding forward is a caller error; it is asserted in debug builds
    /// and clamped to the current cursor otherwise.
    pub fn rewind(&mut self, offset: usize) {
        debug_assert!(
            offset <= self.cursor,
            "cannot rewind block forward ({offset} > {})",
            self.cursor
        );
        self.cursor = offset.min(self.cursor);
    }

    /// Overwrite `[offset, offset + len)` with `byte`.
    pub(crate) fn fill(&mut self, offset: usize, len: usize, byte: u8) {
        self.memory.fill(offset, len, byte);
    }

    /// Whether `ptr` could have been handed out by this block.
    ///
    /// The end address is included: a zero-size request on a full block
    /// returns it.
    pub fn contains(&self, ptr: *const u8) -> bool {
        let base = self.memory.base_addr();
        (base..=base + self.capacity()).contains(&ptr.addr())
    }

    /// Bytes currently allocated (cursor position).
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    /// Remaining free capacity in bytes.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// Identity of this block within its stack.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("serial", &self.serial)
            .field("used", &self.cursor)
            .field("capacity", &self.capacity())
            .finish()
    }
}
