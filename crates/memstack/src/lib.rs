//! memstack: a stack-discipline memory arena.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the memstack sub-crates. For most users, adding `memstack` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use memstack::prelude::*;
//!
//! let mut stack = MemoryStack::with_config(StackConfig::new(1024)).unwrap();
//!
//! // Scratch space for one operation, released on every exit path.
//! fn checksum(stack: &mut MemoryStack, input: &[u8]) -> u32 {
//!     let mut scope = UnwindGuard::new(stack);
//!     let buf = scope.allocate(input.len(), 1);
//!     let scratch = unsafe {
//!         std::ptr::copy_nonoverlapping(input.as_ptr(), buf.as_ptr(), input.len());
//!         std::slice::from_raw_parts(buf.as_ptr(), input.len())
//!     };
//!     scratch.iter().map(|&b| b as u32).sum()
//! }
//!
//! assert_eq!(checksum(&mut stack, &[1, 2, 3]), 6);
//! assert_eq!(stack.outstanding(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `memstack-arena` | `MemoryStack`, `Marker`, `UnwindGuard`, blocks, growth policy |
//! | [`alloc`] | `memstack-core` | Alignment utilities, allocator traits, leak handler, fallback composite |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Memory stack, markers and unwind guards (`memstack-arena`).
pub use memstack_arena as arena;

/// Alignment utilities, allocator traits and the leak handler
/// (`memstack-core`).
///
/// The traits [`alloc::RawAllocator`] and [`alloc::ComposableAllocator`] let
/// generic code use a [`arena::MemoryStack`] interchangeably with other
/// allocators, for example behind a [`alloc::FallbackAllocator`].
pub use memstack_core as alloc;

/// Common imports for typical memstack usage.
///
/// ```rust
/// use memstack::prelude::*;
/// ```
pub mod prelude {
    // Stack
    pub use memstack_arena::{
        BlockRetention, GrowthPolicy, Marker, MemoryStack, StackConfig, StackError, UnwindGuard,
    };

    // Alignment
    pub use memstack_core::{alignment_for, is_aligned, MAX_ALIGNMENT};

    // Allocator contract
    pub use memstack_core::{
        AllocError, ComposableAllocator, FallbackAllocator, HeapAllocator, RawAllocator,
    };

    // Leak reporting
    pub use memstack_core::{get_leak_handler, set_leak_handler, AllocatorInfo, LeakHandler};
}
