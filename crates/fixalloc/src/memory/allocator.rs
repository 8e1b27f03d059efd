//! # Two-Class Allocator
//!
//! Routes requests to a small or a large [`FixedBlockPool`] by size, and
//! releases to whichever pool issued the handle.

use std::fmt;

use bytemuck::Pod;

use super::pool::{BlockHandle, FixedBlockPool, PoolStats};
use crate::config::{
    AllocatorConfig, LARGE_BLOCK_SIZE, LARGE_CAPACITY, SMALL_BLOCK_SIZE, SMALL_CAPACITY,
};
use crate::error::{AllocError, AllocResult, ConfigResult};

/// The size classes served by an [`Allocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// Requests up to the small block size (15 bytes by default).
    Small,
    /// Requests above the small block size, up to the large block size
    /// (180 bytes by default).
    Large,
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => f.write_str("small"),
            Self::Large => f.write_str("large"),
        }
    }
}

/// Counters of both pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Small class counters.
    pub small: PoolStats,
    /// Large class counters.
    pub large: PoolStats,
}

/// Fixed-block allocator with two size classes.
///
/// Owns one pool per class. Construct one per owner and pass it to the code
/// that needs it; instances are fully independent.
///
/// # Example
///
/// ```rust
/// use fixalloc::Allocator;
///
/// let mut alloc = Allocator::new();
///
/// let a = alloc.allocate(15).unwrap();
/// let b = alloc.allocate(180).unwrap();
/// assert_ne!(a, b);
///
/// alloc.free(a);
/// assert_eq!(alloc.allocate(10), Some(a));
///
/// assert!(alloc.allocate(878).is_none());
/// ```
#[derive(Debug)]
pub struct Allocator {
    small: FixedBlockPool,
    large: FixedBlockPool,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator {
    /// Creates an allocator with the default classes: 2000 blocks of 15
    /// bytes and 500 blocks of 180 bytes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            small: FixedBlockPool::build(SMALL_BLOCK_SIZE, SMALL_CAPACITY),
            large: FixedBlockPool::build(LARGE_BLOCK_SIZE, LARGE_CAPACITY),
        }
    }

    /// Creates an allocator from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration fails validation.
    pub fn with_config(config: &AllocatorConfig) -> ConfigResult<Self> {
        config.validate()?;
        let small = FixedBlockPool::from_config(&config.small)?;
        let large = FixedBlockPool::from_config(&config.large)?;

        tracing::info!(
            "Allocator ready: small {}x{}B, large {}x{}B",
            small.capacity(),
            small.block_size(),
            large.capacity(),
            large.block_size()
        );

        Ok(Self { small, large })
    }

    /// Resets both pools to empty. Idempotent.
    ///
    /// Equivalent to [`reset`](Self::reset).
    #[inline]
    pub fn initialize(&mut self) {
        self.reset();
    }

    /// Forgets every outstanding block in both pools.
    ///
    /// Handles issued before the reset become stale.
    pub fn reset(&mut self) {
        self.small.reset();
        self.large.reset();
        tracing::debug!("Allocator reset");
    }

    /// Returns the class a request of `size` bytes is routed to.
    #[inline]
    #[must_use]
    pub fn class_for(&self, size: usize) -> Option<SizeClass> {
        if size <= self.small.block_size() {
            Some(SizeClass::Small)
        } else if size <= self.large.block_size() {
            Some(SizeClass::Large)
        } else {
            None
        }
    }

    /// Returns the class whose pool issued the handle.
    #[inline]
    #[must_use]
    pub fn class_of(&self, handle: BlockHandle) -> Option<SizeClass> {
        if self.small.owns(handle) {
            Some(SizeClass::Small)
        } else if self.large.owns(handle) {
            Some(SizeClass::Large)
        } else {
            None
        }
    }

    /// Returns the pool serving a class.
    #[inline]
    #[must_use]
    pub const fn pool(&self, class: SizeClass) -> &FixedBlockPool {
        match class {
            SizeClass::Small => &self.small,
            SizeClass::Large => &self.large,
        }
    }

    #[inline]
    fn pool_mut(&mut self, class: SizeClass) -> &mut FixedBlockPool {
        match class {
            SizeClass::Small => &mut self.small,
            SizeClass::Large => &mut self.large,
        }
    }

    /// Allocates a block able to hold `size` bytes.
    ///
    /// This is a **O(1)** operation with **zero heap allocations**.
    ///
    /// # Returns
    ///
    /// None if `size` exceeds the large class or the selected pool is
    /// exhausted. A zero-byte request is served by the small class.
    #[inline]
    #[must_use]
    pub fn allocate(&mut self, size: usize) -> Option<BlockHandle> {
        self.try_allocate(size).ok()
    }

    /// Allocates a block able to hold `size` bytes, reporting why it failed.
    ///
    /// # Errors
    ///
    /// - [`AllocError::UnsupportedSize`] if `size` exceeds the large class;
    ///   no pool is consulted.
    /// - [`AllocError::OutOfBlocks`] if the selected pool is exhausted.
    pub fn try_allocate(&mut self, size: usize) -> AllocResult<BlockHandle> {
        let Some(class) = self.class_for(size) else {
            tracing::debug!("Rejected {size}-byte request");
            return Err(AllocError::UnsupportedSize {
                requested: size,
                max: self.large.block_size(),
            });
        };

        let pool = self.pool_mut(class);
        pool.acquire().ok_or_else(|| {
            tracing::debug!("{class} pool exhausted");
            AllocError::OutOfBlocks {
                class,
                capacity: pool.capacity(),
            }
        })
    }

    /// Returns a block to the pool that issued it.
    ///
    /// [`BlockHandle::NULL`], handles from another allocator, handles from
    /// before a reset, and already freed handles are ignored.
    pub fn free(&mut self, handle: BlockHandle) {
        if handle.is_null() {
            return;
        }

        let released = match self.class_of(handle) {
            Some(class) => self.pool_mut(class).release(handle),
            None => false,
        };
        if !released {
            tracing::debug!("Ignored free of {handle:?}");
        }
    }

    /// Gets the payload bytes of a live block.
    #[must_use]
    pub fn block(&self, handle: BlockHandle) -> Option<&[u8]> {
        self.pool(self.class_of(handle)?).block(handle)
    }

    /// Gets the payload bytes of a live block mutably.
    pub fn block_mut(&mut self, handle: BlockHandle) -> Option<&mut [u8]> {
        let class = self.class_of(handle)?;
        self.pool_mut(class).block_mut(handle)
    }

    /// Writes a plain-old-data value at the start of a block.
    ///
    /// # Errors
    ///
    /// - [`AllocError::StaleHandle`] if the handle is not live.
    /// - [`AllocError::PayloadTooLarge`] if `T` does not fit in the block.
    pub fn store<T: Pod>(&mut self, handle: BlockHandle, value: &T) -> AllocResult<()> {
        let block = self.block_mut(handle).ok_or(AllocError::StaleHandle)?;
        let bytes = bytemuck::bytes_of(value);
        if bytes.len() > block.len() {
            return Err(AllocError::PayloadTooLarge {
                size: bytes.len(),
                block_size: block.len(),
            });
        }
        block[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Reads a plain-old-data value from the start of a block.
    ///
    /// # Errors
    ///
    /// - [`AllocError::StaleHandle`] if the handle is not live.
    /// - [`AllocError::PayloadTooLarge`] if `T` does not fit in the block.
    pub fn load<T: Pod>(&self, handle: BlockHandle) -> AllocResult<T> {
        let block = self.block(handle).ok_or(AllocError::StaleHandle)?;
        let size = std::mem::size_of::<T>();
        if size > block.len() {
            return Err(AllocError::PayloadTooLarge {
                size,
                block_size: block.len(),
            });
        }
        Ok(bytemuck::pod_read_unaligned(&block[..size]))
    }

    /// Returns a snapshot of both pools' counters.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            small: self.small.stats(),
            large: self.large.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizeClassConfig;

    fn tiny() -> Allocator {
        Allocator::with_config(&AllocatorConfig {
            small: SizeClassConfig::new(15, 3),
            large: SizeClassConfig::new(180, 2),
        })
        .unwrap()
    }

    #[test]
    fn test_routing_boundaries() {
        let alloc = Allocator::new();
        assert_eq!(alloc.class_for(0), Some(SizeClass::Small));
        assert_eq!(alloc.class_for(15), Some(SizeClass::Small));
        assert_eq!(alloc.class_for(16), Some(SizeClass::Large));
        assert_eq!(alloc.class_for(180), Some(SizeClass::Large));
        assert_eq!(alloc.class_for(181), None);
    }

    #[test]
    fn test_allocate_lands_in_routed_pool() {
        let mut alloc = tiny();
        let small = alloc.allocate(0).unwrap();
        let large = alloc.allocate(16).unwrap();

        assert_eq!(alloc.class_of(small), Some(SizeClass::Small));
        assert_eq!(alloc.class_of(large), Some(SizeClass::Large));
        assert_eq!(alloc.stats().small.allocated, 1);
        assert_eq!(alloc.stats().large.allocated, 1);
    }

    #[test]
    fn test_unsupported_size_leaves_pools_untouched() {
        let mut alloc = tiny();
        assert_eq!(
            alloc.try_allocate(181),
            Err(AllocError::UnsupportedSize {
                requested: 181,
                max: 180
            })
        );
        assert_eq!(alloc.stats().small.high_water_mark, 0);
        assert_eq!(alloc.stats().large.high_water_mark, 0);
    }

    #[test]
    fn test_out_of_blocks() {
        let mut alloc = tiny();
        let _ = alloc.allocate(100).unwrap();
        let _ = alloc.allocate(100).unwrap();

        assert_eq!(
            alloc.try_allocate(100),
            Err(AllocError::OutOfBlocks {
                class: SizeClass::Large,
                capacity: 2
            })
        );
        // The other class is unaffected.
        assert!(alloc.allocate(1).is_some());
    }

    #[test]
    fn test_free_none_and_foreign() {
        let mut alloc = tiny();
        let mut other = tiny();

        let mine = alloc.allocate(8).unwrap();
        let theirs = other.allocate(8).unwrap();

        alloc.free(BlockHandle::NULL);
        alloc.free(theirs);
        assert_eq!(alloc.stats().small.free_list_len, 0);

        alloc.free(mine);
        assert_eq!(alloc.allocate(8), Some(mine));
    }

    #[test]
    fn test_store_and_load() {
        let mut alloc = tiny();
        let small = alloc.allocate(8).unwrap();
        let large = alloc.allocate(64).unwrap();

        alloc.store(small, &0x0123_4567_89AB_CDEFu64).unwrap();
        assert_eq!(alloc.load::<u64>(small), Ok(0x0123_4567_89AB_CDEF));

        let values = [7u32; 16];
        alloc.store(large, &values).unwrap();
        assert_eq!(alloc.load::<[u32; 16]>(large), Ok(values));

        assert_eq!(
            alloc.store(small, &[0u64; 2]),
            Err(AllocError::PayloadTooLarge {
                size: 16,
                block_size: 15
            })
        );

        alloc.free(small);
        assert_eq!(alloc.load::<u64>(small), Err(AllocError::StaleHandle));
    }

    #[test]
    fn test_initialize_invalidates_handles() {
        let mut alloc = tiny();
        let before = alloc.allocate(4).unwrap();

        alloc.initialize();
        assert!(alloc.block(before).is_none());

        let after = alloc.allocate(4).unwrap();
        assert_eq!(after.index(), 0);

        // Freeing the stale handle must not push the reissued slot.
        alloc.free(before);
        assert_eq!(alloc.stats().small.free_list_len, 0);
        assert!(alloc.block(after).is_some());
    }

    #[test]
    fn test_size_class_display() {
        assert_eq!(SizeClass::Small.to_string(), "small");
        assert_eq!(SizeClass::Large.to_string(), "large");
    }
}
