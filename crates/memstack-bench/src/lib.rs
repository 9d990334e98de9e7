//! Benchmark workloads for the memstack allocator.
//!
//! Provides deterministic request mixes shared by the Criterion benches:
//!
//! - [`small_requests`]: many small, mixed-alignment scratch allocations
//! - [`mixed_requests`]: small requests interleaved with block-spilling ones

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use memstack_arena::{MemoryStack, StackConfig};

/// A single `(size, alignment)` allocation request.
pub type Request = (usize, usize);

/// `count` requests of 1..=64 bytes with alignments 1..=16.
///
/// The sequence depends only on `count`, so runs are comparable.
pub fn small_requests(count: usize) -> Vec<Request> {
    (0..count)
        .map(|i| {
            let size = 1 + (i * 37) % 64;
            let alignment = 1 << (i % 5);
            (size, alignment)
        })
        .collect()
}

/// Like [`small_requests`], but every 16th request asks for 8 KiB so the
/// stack keeps crossing block boundaries.
pub fn mixed_requests(count: usize) -> Vec<Request> {
    small_requests(count)
        .into_iter()
        .enumerate()
        .map(|(i, req)| if i % 16 == 15 { (8 * 1024, 16) } else { req })
        .collect()
}

/// Stack used by the benches: 4 KiB initial block, default growth.
pub fn bench_stack() -> MemoryStack {
    MemoryStack::with_config(StackConfig::new(4096).with_debug_fill(false))
        .expect("bench config is valid")
}
