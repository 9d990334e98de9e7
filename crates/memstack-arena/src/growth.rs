//! Block sizing policy.

use memstack_core::align::round_up;
use memstack_core::MAX_ALIGNMENT;

/// Decides the capacity of the next block a stack appends.
///
/// The next block is at least `growth_factor` times the capacity already
/// owned, so the number of blocks stays logarithmic in the total volume,
/// and never smaller than `min_block_size`. A request larger than the
/// geometric step gets a block sized to fit it exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthPolicy {
    /// Smallest block the policy will ever ask for, in bytes.
    pub min_block_size: usize,
    /// Multiplier applied to the current total capacity.
    pub growth_factor: f64,
}

impl GrowthPolicy {
    /// Create a policy with the given minimum block size and factor.
    pub fn new(min_block_size: usize, growth_factor: f64) -> Self {
        Self {
            min_block_size,
            growth_factor,
        }
    }

    /// Capacity of the next block.
    ///
    /// `current_total` is the capacity already owned; `requested` is the
    /// number of bytes the triggering allocation needs, alignment slack
    /// included. The result is a multiple of [`MAX_ALIGNMENT`] and
    /// saturates near `usize::MAX` instead of overflowing.
    pub fn next_capacity(&self, current_total: usize, requested: usize) -> usize {
        // Float-to-int `as` saturates, so huge totals cannot wrap.
        let geometric = (current_total as f64 * self.growth_factor).ceil() as usize;
        let capacity = self.min_block_size.max(requested).max(geometric);
        round_up(capacity, MAX_ALIGNMENT).unwrap_or(usize::MAX & !(MAX_ALIGNMENT - 1))
    }
}
