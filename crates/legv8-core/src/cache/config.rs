use thiserror::Error;

use super::address::CacheGeometry;

/// Default block size in bytes (one doubleword).
pub const DEFAULT_BLOCK_SIZE: usize = 8;
/// Default total cache size in bytes (16 blocks).
pub const DEFAULT_CACHE_SIZE: usize = 16 * DEFAULT_BLOCK_SIZE;

/// Invalid `(size, blocksize)` pair, detected when a cache is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CacheConfigError {
    /// Block size of zero bytes.
    #[error("Block size must be at least 1 byte.")]
    ZeroBlockSize,
    /// Total size is not a whole number of blocks.
    #[error("Total cache size {size} bytes is not a multiple of {blocksize} bytes.")]
    SizeNotMultipleOfBlockSize {
        /// Requested total size.
        size: usize,
        /// Requested block size.
        blocksize: usize,
    },
    /// Entry count cannot be indexed by a bit mask.
    #[error("Number of entries {entries} is not a power of 2, leading to invalid index")]
    EntriesNotPowerOfTwo {
        /// `size / blocksize`.
        entries: usize,
    },
}

/// Requested cache geometry, both fields in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheConfig {
    /// Total capacity.
    pub size: usize,
    /// Bytes per block.
    pub blocksize: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl CacheConfig {
    /// 128-byte cache with 8-byte blocks.
    pub const DEFAULT: Self = Self {
        size: DEFAULT_CACHE_SIZE,
        blocksize: DEFAULT_BLOCK_SIZE,
    };

    /// Creates a configuration without validating it.
    #[must_use]
    pub const fn new(size: usize, blocksize: usize) -> Self {
        Self { size, blocksize }
    }

    /// A zero-sized cache stands for "no cache".
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.size == 0
    }

    /// Checks the geometry invariants and derives the bit-field widths.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConfigError`] when the block size is zero, the size is
    /// not a multiple of it, or the entry count is not a power of two.
    pub const fn validate(&self) -> Result<CacheGeometry, CacheConfigError> {
        if self.blocksize == 0 {
            return Err(CacheConfigError::ZeroBlockSize);
        }
        if self.size % self.blocksize != 0 {
            return Err(CacheConfigError::SizeNotMultipleOfBlockSize {
                size: self.size,
                blocksize: self.blocksize,
            });
        }
        let entries = self.size / self.blocksize;
        if !entries.is_power_of_two() {
            return Err(CacheConfigError::EntriesNotPowerOfTwo { entries });
        }
        Ok(CacheGeometry::new(self.size, self.blocksize, entries))
    }
}
