//! Memory stack configuration parameters.

use crate::error::StackError;
use crate::growth::GrowthPolicy;

/// What happens to blocks released by an unwind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockRetention {
    /// Keep released blocks in a cache and reuse them on the next growth
    /// that fits. Repeated allocate/unwind cycles then touch the global
    /// allocator only once. Cached memory is returned by
    /// [`MemoryStack::shrink_to_fit`](crate::MemoryStack::shrink_to_fit).
    #[default]
    Cache,
    /// Free released blocks immediately.
    Release,
}

/// Configuration for a [`MemoryStack`](crate::MemoryStack).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct StackConfig {
    /// Capacity of the block allocated at construction, in bytes.
    ///
    /// Default: 4096. Must be non-zero. This block is never released by
    /// an unwind.
    pub initial_block_size: usize,

    /// Smallest block the growth policy will allocate, in bytes.
    ///
    /// Default: 1024. Must be non-zero.
    pub min_block_size: usize,

    /// Next block capacity as a multiple of the capacity already owned.
    ///
    /// Default: 1.0 (each new block matches the current total, so total
    /// capacity doubles). Must be finite and positive.
    pub growth_factor: f64,

    /// Fate of blocks released by an unwind. Default: [`BlockRetention::Cache`].
    pub retention: BlockRetention,

    /// Fill freshly reserved bytes with [`NEW_MEMORY_PATTERN`] and released
    /// bytes with [`FREED_MEMORY_PATTERN`].
    ///
    /// Default: on in debug builds, off in release builds.
    pub debug_fill: bool,
}

/// Byte written over memory as it is handed out (when `debug_fill` is on).
pub const NEW_MEMORY_PATTERN: u8 = 0xCD;

/// Byte written over memory as it is released (when `debug_fill` is on).
pub const FREED_MEMORY_PATTERN: u8 = 0xDD;

impl StackConfig {
    /// Default initial block size in bytes.
    pub const DEFAULT_INITIAL_BLOCK_SIZE: usize = 4096;

    /// Default minimum block size in bytes.
    pub const DEFAULT_MIN_BLOCK_SIZE: usize = 1024;

    /// Default growth factor.
    pub const DEFAULT_GROWTH_FACTOR: f64 = 1.0;

    /// Create a config whose initial block holds `initial_block_size` bytes.
    ///
    /// Uses default values for all other parameters.
    pub fn new(initial_block_size: usize) -> Self {
        Self {
            initial_block_size,
            min_block_size: Self::DEFAULT_MIN_BLOCK_SIZE,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            retention: BlockRetention::default(),
            debug_fill: cfg!(debug_assertions),
        }
    }

    /// Set the minimum block size.
    pub fn with_min_block_size(mut self, min_block_size: usize) -> Self {
        self.min_block_size = min_block_size;
        self
    }

    /// Set the growth factor.
    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Set the block retention mode.
    pub fn with_retention(mut self, retention: BlockRetention) -> Self {
        self.retention = retention;
        self
    }

    /// Enable or disable debug fill patterns.
    pub fn with_debug_fill(mut self, debug_fill: bool) -> Self {
        self.debug_fill = debug_fill;
        self
    }

    /// The growth policy described by this config.
    pub fn growth_policy(&self) -> GrowthPolicy {
        GrowthPolicy::new(self.min_block_size, self.growth_factor)
    }

    /// Check every parameter against its documented range.
    pub fn validate(&self) -> Result<(), StackError> {
        if self.initial_block_size == 0 {
            return Err(StackError::InvalidConfig {
                reason: "initial_block_size must be non-zero".into(),
            });
        }
        if self.initial_block_size > isize::MAX as usize {
            return Err(StackError::InvalidConfig {
                reason: format!(
                    "initial_block_size must not exceed isize::MAX (got {})",
                    self.initial_block_size
                ),
            });
        }
        if self.min_block_size == 0 {
            return Err(StackError::InvalidConfig {
                reason: "min_block_size must be non-zero".into(),
            });
        }
        if !self.growth_factor.is_finite() || self.growth_factor <= 0.0 {
            return Err(StackError::InvalidConfig {
                reason: format!(
                    "growth_factor must be finite and positive (got {})",
                    self.growth_factor
                ),
            });
        }
        Ok(())
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = StackConfig::default();
        assert_eq!(config.initial_block_size, 4096);
        assert_eq!(config.min_block_size, 1024);
        assert_eq!(config.retention, BlockRetention::Cache);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_setters_apply() {
        let config = StackConfig::new(64)
            .with_min_block_size(64)
            .with_growth_factor(2.0)
            .with_retention(BlockRetention::Release)
            .with_debug_fill(false);
        assert_eq!(config.growth_policy(), GrowthPolicy::new(64, 2.0));
        assert_eq!(config.retention, BlockRetention::Release);
        assert!(!config.debug_fill);
    }

    #[test]
    fn zero_sizes_rejected() {
        assert!(matches!(
            StackConfig::new(0).validate(),
            Err(StackError::InvalidConfig { .. })
        ));
        assert!(matches!(
            StackConfig::new(64).with_min_block_size(0).validate(),
            Err(StackError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn bad_growth_factor_rejected() {
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = StackConfig::default().with_growth_factor(factor).validate();
            assert!(
                matches!(result, Err(StackError::InvalidConfig { .. })),
                "factor {factor} accepted"
            );
        }
    }
}
