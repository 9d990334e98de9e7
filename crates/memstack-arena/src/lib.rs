//! Block-based stack allocator with marker unwinding.
//!
//! A [`MemoryStack`] hands out short-lived allocations from large blocks
//! with O(1) bump allocation and releases them in bulk by unwinding to a
//! [`Marker`]. This crate performs `unsafe` operations only in `raw.rs`.
//!
//! # Architecture
//!
//! ```text
//! MemoryStack
//! ├── Block[] (active, oldest → current; bump cursor each)
//! │   └── RawBlock (MAX_ALIGNMENT-aligned heap region)
//! ├── Block[] cache (released by unwind, reused on growth)
//! ├── GrowthPolicy (next block capacity)
//! └── outstanding byte count → leak handler on drop
//!
//! UnwindGuard ── &mut MemoryStack + Marker, unwinds on drop
//! ```
//!
//! # Example
//!
//! ```
//! use memstack_arena::MemoryStack;
//! use memstack_core::is_aligned;
//!
//! let mut stack = MemoryStack::new();
//! let start = stack.top();
//! let ptr = stack.allocate(10, 4);
//! assert!(is_aligned(ptr.as_ptr(), 4));
//! stack.unwind(start);
//! assert_eq!(stack.outstanding(), 0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod block;
pub mod config;
pub mod error;
pub mod growth;
pub mod guard;
pub mod marker;
mod raw;
pub mod stack;

// Public re-exports for the primary API surface.
pub use config::{BlockRetention, StackConfig};
pub use error::StackError;
pub use growth::GrowthPolicy;
pub use guard::UnwindGuard;
pub use marker::Marker;
pub use stack::MemoryStack;
