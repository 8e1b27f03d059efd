//! # Fixed Block Pool
//!
//! One size class: `capacity` blocks of `block_size` bytes, reserved once.
//!
//! Blocks come from two places, in order:
//! 1. the free stack, most recently released first
//! 2. the bump index, for blocks never handed out since the last reset
//!
//! Payload bytes and free-list bookkeeping live in separate arrays, so a
//! released block is never reinterpreted as a link.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::SizeClassConfig;
use crate::error::{ConfigError, ConfigResult};

/// Storage word. Every block starts on a word boundary.
const WORD: usize = std::mem::size_of::<u64>();

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a pool.
///
/// Drawn from a 64-bit counter, so ids do not repeat within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PoolId(u64);

impl PoolId {
    fn next() -> Self {
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Opaque handle to a block handed out by a [`FixedBlockPool`].
///
/// Carries the owning pool, the pool epoch at acquisition time, and the slot
/// index. Handles from before a reset never validate again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockHandle {
    pool: PoolId,
    epoch: u64,
    index: u32,
}

impl BlockHandle {
    /// Null handle. Never issued by any pool; freeing it is a no-op.
    pub const NULL: Self = Self {
        pool: PoolId(u64::MAX),
        epoch: u64::MAX,
        index: u32::MAX,
    };

    /// Checks if this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.pool.0 == u64::MAX && self.epoch == u64::MAX && self.index == u32::MAX
    }

    /// Returns the owning pool.
    #[inline]
    #[must_use]
    pub const fn pool(self) -> PoolId {
        self.pool
    }

    /// Returns the slot index within the owning pool.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

impl Default for BlockHandle {
    fn default() -> Self {
        Self::NULL
    }
}

/// Lifecycle state of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolState {
    /// Fresh or just reset; no block carved yet.
    Empty,
    /// Some blocks carved, and a block is still obtainable.
    PartiallyUsed,
    /// Every block carved and none released.
    Exhausted,
}

/// Point-in-time counters of a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Payload bytes per block.
    pub block_size: usize,
    /// Total blocks reserved.
    pub capacity: usize,
    /// Blocks carved since the last reset.
    pub high_water_mark: usize,
    /// Released blocks waiting for reuse.
    pub free_list_len: usize,
    /// Blocks currently handed out.
    pub allocated: usize,
}

/// A pool of fixed-size blocks.
///
/// All operations are **O(1)** and perform **zero heap allocations** after
/// construction.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Wrap the owning allocator in a
/// [`SharedAllocator`](crate::SharedAllocator) to share it.
///
/// # Example
///
/// ```rust
/// use fixalloc::FixedBlockPool;
///
/// let mut pool = FixedBlockPool::new(15, 4).unwrap();
///
/// let first = pool.acquire().unwrap();
/// pool.block_mut(first).unwrap()[..5].copy_from_slice(b"hello");
///
/// pool.release(first);
/// assert_eq!(pool.acquire(), Some(first)); // LIFO reuse
/// ```
pub struct FixedBlockPool {
    id: PoolId,
    /// Bumped by every reset. 64 bits, so a stale handle never matches again.
    epoch: u64,
    /// `capacity * words_per_block` words, never resized.
    storage: Box<[u64]>,
    words_per_block: usize,
    block_size: usize,
    capacity: u32,
    /// Stack of released slot indices.
    free_list: Vec<u32>,
    high_water_mark: u32,
    /// Whether each slot is currently handed out. Entries at or above
    /// `high_water_mark` are stale and never read.
    live: Box<[bool]>,
}

impl FixedBlockPool {
    /// Creates a pool, reserving all storage upfront.
    ///
    /// # Arguments
    ///
    /// * `block_size` - Payload bytes per block
    /// * `capacity` - Number of blocks
    ///
    /// # Errors
    ///
    /// Returns error if either argument is zero, or the capacity does not fit
    /// a 32-bit slot index.
    pub fn new(block_size: usize, capacity: usize) -> ConfigResult<Self> {
        SizeClassConfig::new(block_size, capacity).validate()?;
        let slots = u32::try_from(capacity).map_err(|_| ConfigError::InvalidCapacity(capacity))?;
        if capacity.checked_mul(block_size.div_ceil(WORD)).is_none() {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        Ok(Self::build(block_size, slots))
    }

    /// Builds a pool from parameters already known to be valid.
    pub(crate) fn build(block_size: usize, capacity: u32) -> Self {
        let slots = capacity as usize;
        let words_per_block = block_size.div_ceil(WORD);

        Self {
            id: PoolId::next(),
            epoch: 0,
            storage: vec![0u64; slots * words_per_block].into_boxed_slice(),
            words_per_block,
            block_size,
            capacity,
            free_list: Vec::with_capacity(slots),
            high_water_mark: 0,
            live: vec![false; slots].into_boxed_slice(),
        }
    }

    /// Creates a pool from a size class configuration.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_config(config: &SizeClassConfig) -> ConfigResult<Self> {
        Self::new(config.block_size, config.capacity)
    }

    /// Returns this pool's identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PoolId {
        self.id
    }

    /// Returns the payload bytes per block.
    #[inline]
    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the distance in bytes between consecutive blocks.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.words_per_block * WORD
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Returns the number of blocks carved since the last reset.
    #[inline]
    #[must_use]
    pub const fn high_water_mark(&self) -> usize {
        self.high_water_mark as usize
    }

    /// Returns the number of released blocks awaiting reuse.
    #[inline]
    #[must_use]
    pub fn free_list_len(&self) -> usize {
        self.free_list.len()
    }

    /// Returns the number of blocks currently handed out.
    #[inline]
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.high_water_mark() - self.free_list.len()
    }

    /// Returns the number of blocks that can still be acquired.
    #[inline]
    #[must_use]
    pub fn available(&self) -> usize {
        self.capacity() - self.allocated_count()
    }

    /// Returns true if the next [`acquire`](Self::acquire) will fail.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.high_water_mark == self.capacity && self.free_list.is_empty()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> PoolState {
        if self.high_water_mark == 0 {
            PoolState::Empty
        } else if self.is_exhausted() {
            PoolState::Exhausted
        } else {
            PoolState::PartiallyUsed
        }
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            block_size: self.block_size,
            capacity: self.capacity(),
            high_water_mark: self.high_water_mark(),
            free_list_len: self.free_list.len(),
            allocated: self.allocated_count(),
        }
    }

    /// Returns true if the handle was issued by this pool.
    ///
    /// Says nothing about whether the block is still live.
    #[inline]
    #[must_use]
    pub fn owns(&self, handle: BlockHandle) -> bool {
        handle.pool == self.id
    }

    /// Returns true if the handle refers to a block currently handed out.
    #[inline]
    #[must_use]
    pub fn is_live(&self, handle: BlockHandle) -> bool {
        self.owns(handle)
            && handle.epoch == self.epoch
            && handle.index < self.high_water_mark
            && self.live[handle.index()]
    }

    /// Hands out a block.
    ///
    /// This is a **O(1)** operation with **zero heap allocations**.
    ///
    /// # Returns
    ///
    /// The most recently released block if any, else the next never-used
    /// block, or None if the pool is exhausted.
    pub fn acquire(&mut self) -> Option<BlockHandle> {
        let index = if let Some(index) = self.free_list.pop() {
            index
        } else if self.high_water_mark < self.capacity {
            let index = self.high_water_mark;
            self.high_water_mark += 1;
            index
        } else {
            return None;
        };

        self.live[index as usize] = true;
        Some(BlockHandle {
            pool: self.id,
            epoch: self.epoch,
            index,
        })
    }

    /// Returns a block to the pool.
    ///
    /// This is a **O(1)** operation with **zero heap deallocations**.
    ///
    /// # Returns
    ///
    /// False, with no effect, if the handle is foreign, stale, or already
    /// released.
    pub fn release(&mut self, handle: BlockHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }

        self.live[handle.index()] = false;
        self.free_list.push(handle.index);
        true
    }

    /// Forgets every outstanding block.
    ///
    /// This is a **O(1)** operation. Storage is kept. Handles issued before
    /// the reset become stale.
    pub fn reset(&mut self) {
        self.free_list.clear();
        self.high_water_mark = 0;
        self.epoch += 1;
    }

    /// Gets the payload bytes of a live block.
    #[must_use]
    pub fn block(&self, handle: BlockHandle) -> Option<&[u8]> {
        if !self.is_live(handle) {
            return None;
        }
        let start = handle.index() * self.words_per_block;
        let words = &self.storage[start..start + self.words_per_block];
        let bytes: &[u8] = bytemuck::cast_slice(words);
        Some(&bytes[..self.block_size])
    }

    /// Gets the payload bytes of a live block mutably.
    pub fn block_mut(&mut self, handle: BlockHandle) -> Option<&mut [u8]> {
        if !self.is_live(handle) {
            return None;
        }
        let start = handle.index() * self.words_per_block;
        let words = &mut self.storage[start..start + self.words_per_block];
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(words);
        Some(&mut bytes[..self.block_size])
    }
}

impl fmt::Debug for FixedBlockPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBlockPool")
            .field("id", &self.id)
            .field("epoch", &self.epoch)
            .field("block_size", &self.block_size)
            .field("capacity", &self.capacity)
            .field("high_water_mark", &self.high_water_mark)
            .field("free_list_len", &self.free_list.len())
            .finish_non_exhaustive()
    }
}
