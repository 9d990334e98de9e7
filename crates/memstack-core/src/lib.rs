//! Core types and traits for the memstack allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! pieces shared by every allocator in the workspace:
//!
//! - [`align`]: alignment predicates and natural-alignment helpers
//! - [`traits`]: the [`RawAllocator`] / [`ComposableAllocator`] contract
//! - [`leak`]: the process-wide leak handler hook
//! - [`heap`] and [`fallback`]: a system-heap allocator and a
//!   "try this, then that" composite built on the composable contract
//!
//! `unsafe` is denied crate-wide and allowed only where an allocator
//! contract requires it (`traits.rs`, `heap.rs`, `fallback.rs`).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod align;
pub mod error;
pub mod fallback;
pub mod heap;
pub mod id;
pub mod leak;
pub mod traits;

pub use align::{alignment_for, is_aligned, is_valid_alignment, MAX_ALIGNMENT};
pub use error::AllocError;
pub use fallback::FallbackAllocator;
pub use heap::HeapAllocator;
pub use id::{AllocatorId, AllocatorInfo};
pub use leak::{get_leak_handler, report_leak, set_leak_handler, LeakHandler};
pub use traits::{ComposableAllocator, RawAllocator};
