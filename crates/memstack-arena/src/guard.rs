//! Scoped unwinding.
//!
//! [`UnwindGuard`] captures the stack position when created and unwinds
//! back to it when dropped, on every exit path: normal return, `?`, or a
//! panic. Allocations made through the guard are therefore released
//! without bookkeeping at each call site, unless the guard is disarmed.

use std::ops::{Deref, DerefMut};

use crate::marker::Marker;
use crate::stack::MemoryStack;

/// Unwinds its stack to the position captured at construction when
/// dropped.
///
/// The guard borrows the stack mutably and dereferences to it, so
/// allocations in the scope go through the guard. Guards nest:
///
/// ```
/// use memstack_arena::{MemoryStack, UnwindGuard};
///
/// let mut stack = MemoryStack::new();
/// {
///     let mut outer = UnwindGuard::new(&mut stack);
///     outer.allocate(64, 8);
///     {
///         let mut inner = UnwindGuard::new(&mut outer);
///         inner.allocate(128, 8);
///     }
///     assert_eq!(outer.outstanding(), 64);
/// }
/// assert_eq!(stack.outstanding(), 0);
/// ```
#[must_use]
pub struct UnwindGuard<'a> {
    stack: &'a mut MemoryStack,
    marker: Marker,
    armed: bool,
}

impl<'a> UnwindGuard<'a> {
    /// Capture the current position of `stack`.
    pub fn new(stack: &'a mut MemoryStack) -> Self {
        let marker = stack.top();
        Self {
            stack,
            marker,
            armed: true,
        }
    }

    /// Keep the scope's allocations: the guard will not unwind on drop.
    ///
    /// Idempotent.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Unwind to the captured position now.
    ///
    /// The guard stays armed (if it was) and unwinds again on drop.
    pub fn unwind(&mut self) {
        self.stack.unwind(self.marker);
    }

    /// Whether dropping the guard will unwind.
    pub fn will_unwind(&self) -> bool {
        self.armed
    }

    /// The position the guard unwinds to.
    pub fn marker(&self) -> Marker {
        self.marker
    }
}

impl Deref for UnwindGuard<'_> {
    type Target = MemoryStack;

    fn deref(&self) -> &MemoryStack {
        self.stack
    }
}

impl DerefMut for UnwindGuard<'_> {
    fn deref_mut(&mut self) -> &mut MemoryStack {
        self.stack
    }
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.stack.unwind(self.marker);
        }
    }
}
