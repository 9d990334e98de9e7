//! Criterion micro-benchmarks for stack allocation, unwinding and guards.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use memstack_bench::{bench_stack, mixed_requests, small_requests};
use memstack_core::traits::RawAllocator;
use memstack_core::HeapAllocator;

/// Benchmark: 1K small allocations followed by a single unwind.
fn bench_allocate_unwind_1k(c: &mut Criterion) {
    let requests = small_requests(1024);
    let mut stack = bench_stack();
    c.bench_function("stack_allocate_unwind_1k", |b| {
        b.iter(|| {
            let marker = stack.top();
            for &(size, alignment) in &requests {
                black_box(stack.allocate(size, alignment));
            }
            stack.unwind(marker);
        });
    });
}

/// Benchmark: same workload as above, paying the heap for every request.
fn bench_heap_alloc_free_1k(c: &mut Criterion) {
    let requests = small_requests(1024);
    let mut heap = HeapAllocator;
    let mut live = Vec::with_capacity(requests.len());
    c.bench_function("heap_alloc_free_1k", |b| {
        b.iter(|| {
            for &(size, alignment) in &requests {
                live.push((heap.allocate(size, alignment), size, alignment));
            }
            for (ptr, size, alignment) in live.drain(..) {
                unsafe { heap.deallocate(black_box(ptr), size, alignment) };
            }
        });
    });
}

/// Benchmark: requests that spill across blocks, with cached-block reuse.
fn bench_block_spill_1k(c: &mut Criterion) {
    let requests = mixed_requests(1024);
    let mut stack = bench_stack();
    c.bench_function("stack_block_spill_1k", |b| {
        b.iter(|| {
            let marker = stack.top();
            for &(size, alignment) in &requests {
                black_box(stack.allocate(size, alignment));
            }
            stack.unwind(marker);
        });
    });
}

/// Benchmark: nested guarded scopes, as a recursive parser would use them.
fn bench_nested_guards(c: &mut Criterion) {
    let mut stack = bench_stack();
    c.bench_function("stack_nested_guards_64", |b| {
        b.iter(|| {
            let mut outer = stack.guard();
            for depth in 0..64 {
                let mut scope = outer.guard();
                black_box(scope.allocate(16 + depth, 8));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_allocate_unwind_1k,
    bench_heap_alloc_free_1k,
    bench_block_spill_1k,
    bench_nested_guards
);
criterion_main!(benches);
