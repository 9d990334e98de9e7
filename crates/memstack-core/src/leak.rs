//! Process-wide leak handler hook.
//!
//! Allocators that track outstanding volume call [`report_leak`] when they
//! are dropped (or explicitly checked) with memory still handed out. The
//! report is advisory: the handler runs, execution continues.
//!
//! There is exactly one handler per process. Installing a new one replaces
//! the previous one; handlers are not chained. Install handlers during
//! single-threaded startup, since a report racing with an install may see
//! either handler.

use std::sync::{PoisonError, RwLock};

use crate::id::AllocatorInfo;

/// Callback invoked with the leaking allocator and the number of bytes
/// still outstanding.
pub type LeakHandler = fn(AllocatorInfo, usize);

/// `None` means the default handler.
static LEAK_HANDLER: RwLock<Option<LeakHandler>> = RwLock::new(None);

/// The handler used when none has been installed.
///
/// Emits a `tracing` warning naming the allocator and the leaked amount.
pub fn default_leak_handler(info: AllocatorInfo, amount: usize) {
    tracing::warn!(
        allocator = info.name,
        id = info.id.get(),
        bytes = amount,
        "allocator leaked {amount} bytes"
    );
}

/// Install `handler` as the process-wide leak handler.
///
/// `None` restores [`default_leak_handler`]. Returns the handler that was
/// active before the call.
pub fn set_leak_handler(handler: Option<LeakHandler>) -> LeakHandler {
    let mut slot = LEAK_HANDLER
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let previous = slot.unwrap_or(default_leak_handler);
    *slot = handler;
    previous
}

/// The currently installed leak handler.
pub fn get_leak_handler() -> LeakHandler {
    LEAK_HANDLER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .unwrap_or(default_leak_handler)
}

/// Invoke the current leak handler.
///
/// The handler is copied out before it runs, so a handler may itself call
/// [`set_leak_handler`] without deadlocking.
pub fn report_leak(info: AllocatorInfo, amount: usize) {
    let handler = get_leak_handler();
    handler(info, amount);
}
