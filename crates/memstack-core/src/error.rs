//! Allocation error types.
//!
//! These are only ever returned by the `try_*` half of the allocator
//! contract. The infallible half treats exhaustion as fatal.

use std::error::Error;
use std::fmt;

/// Errors reported by [`ComposableAllocator`](crate::ComposableAllocator)
/// operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The underlying memory source could not supply the request.
    OutOfMemory {
        /// Number of bytes requested.
        size: usize,
        /// Requested alignment.
        alignment: usize,
    },
    /// The allocator has no room for the request without growing.
    Exhausted {
        /// Bytes needed, including alignment padding.
        requested: usize,
        /// Bytes still available.
        available: usize,
    },
    /// `count * size` overflowed `usize` in an array request.
    SizeOverflow {
        /// Number of elements requested.
        count: usize,
        /// Size of each element in bytes.
        size: usize,
    },
    /// The alignment is zero, not a power of two, or exceeds what the
    /// allocator supports.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { size, alignment } => {
                write!(
                    f,
                    "out of memory: {size} bytes at alignment {alignment}"
                )
            }
            Self::Exhausted {
                requested,
                available,
            } => {
                write!(
                    f,
                    "allocator exhausted: requested {requested} bytes, {available} bytes available"
                )
            }
            Self::SizeOverflow { count, size } => {
                write!(f, "array size overflow: {count} elements of {size} bytes")
            }
            Self::InvalidAlignment { alignment } => {
                write!(f, "invalid alignment: {alignment}")
            }
        }
    }
}

impl Error for AllocError {}
