//! Allocator identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`AllocatorId`] allocation.
static ALLOCATOR_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for an allocator.
///
/// Allocated from a monotonic atomic counter via [`AllocatorId::next`].
/// Allocators are ordinary Rust values that move freely, so their address
/// is not a stable identity; this ID is. Two distinct instances never
/// share an ID within one process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocatorId(u64);

impl AllocatorId {
    /// Allocate a fresh, unique instance ID. Thread-safe.
    pub fn next() -> Self {
        Self(ALLOCATOR_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AllocatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the allocator a diagnostic refers to.
///
/// Passed to the [leak handler](crate::leak) so a report can name both
/// the kind of allocator and the specific instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AllocatorInfo {
    /// Human-readable allocator kind, e.g. `"memstack::MemoryStack"`.
    pub name: &'static str,
    /// The instance that produced the report.
    pub id: AllocatorId,
}

impl AllocatorInfo {
    /// Create an info record for the given kind and instance.
    pub fn new(name: &'static str, id: AllocatorId) -> Self {
        Self { name, id }
    }
}

impl fmt::Display for AllocatorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = AllocatorId::next();
        let b = AllocatorId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn info_display() {
        let id = AllocatorId::next();
        let info = AllocatorInfo::new("test::Alloc", id);
        assert_eq!(info.to_string(), format!("test::Alloc#{}", id.get()));
    }
}
