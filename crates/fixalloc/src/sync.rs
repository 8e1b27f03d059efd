//! # Shared Allocator
//!
//! The [`Allocator`] itself takes no locks. Callers on several threads share
//! one through this wrapper, which serializes every operation behind a
//! `parking_lot` mutex.
//!
//! ```text
//! Thread A ──┐
//!            ├──> Mutex<Allocator> ──> small pool / large pool
//! Thread B ──┘
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::AllocatorConfig;
use crate::error::{AllocResult, ConfigResult};
use crate::memory::{Allocator, AllocatorStats, BlockHandle};

/// Cloneable, lock-protected handle to one [`Allocator`].
///
/// Clones refer to the same pools.
#[derive(Clone, Debug, Default)]
pub struct SharedAllocator {
    inner: Arc<Mutex<Allocator>>,
}

impl From<Allocator> for SharedAllocator {
    fn from(allocator: Allocator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(allocator)),
        }
    }
}

impl SharedAllocator {
    /// Creates a shared allocator with the default classes.
    #[must_use]
    pub fn new() -> Self {
        Self::from(Allocator::new())
    }

    /// Creates a shared allocator from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration fails validation.
    pub fn with_config(config: &AllocatorConfig) -> ConfigResult<Self> {
        Allocator::with_config(config).map(Self::from)
    }

    /// See [`Allocator::allocate`].
    #[must_use]
    pub fn allocate(&self, size: usize) -> Option<BlockHandle> {
        self.inner.lock().allocate(size)
    }

    /// See [`Allocator::try_allocate`].
    ///
    /// # Errors
    ///
    /// Same as [`Allocator::try_allocate`].
    pub fn try_allocate(&self, size: usize) -> AllocResult<BlockHandle> {
        self.inner.lock().try_allocate(size)
    }

    /// See [`Allocator::free`].
    pub fn free(&self, handle: BlockHandle) {
        self.inner.lock().free(handle);
    }

    /// See [`Allocator::initialize`].
    pub fn initialize(&self) {
        self.inner.lock().initialize();
    }

    /// See [`Allocator::stats`].
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        self.inner.lock().stats()
    }

    /// Runs `f` with exclusive access to the allocator.
    ///
    /// Useful for payload access, which borrows from the pools.
    pub fn with<R>(&self, f: impl FnOnce(&mut Allocator) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
