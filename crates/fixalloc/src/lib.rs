//! # fixalloc
//!
//! Deterministic fixed-block allocator for small objects:
//! - Two size classes: up to 15 bytes, and up to 180 bytes
//! - O(1) allocate and free, no fragmentation
//! - All storage reserved at construction, never grown
//!
//! ## Architecture Rules
//!
//! 1. **One pool per size class** - [`FixedBlockPool`] owns its blocks, its free
//!    stack and its bump index
//! 2. **Most recently freed first** - released blocks are reused LIFO
//! 3. **Handles, not pointers** - [`BlockHandle`] names the owning pool and slot,
//!    so frees are routed without address arithmetic
//! 4. **No hidden globals** - every [`Allocator`] is an independent value
//!
//! ## Example
//!
//! ```rust
//! use fixalloc::{Allocator, AllocError, SizeClass};
//!
//! let mut alloc = Allocator::new();
//!
//! let small = alloc.allocate(15).unwrap();
//! alloc.block_mut(small).unwrap()[..6].copy_from_slice(b"Test15");
//!
//! alloc.free(small);
//! assert_eq!(alloc.allocate(15), Some(small));
//!
//! assert!(matches!(
//!     alloc.try_allocate(878),
//!     Err(AllocError::UnsupportedSize { requested: 878, max: 180 })
//! ));
//! assert_eq!(alloc.class_for(180), Some(SizeClass::Large));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod memory;
pub mod sync;

pub use config::{AllocatorConfig, SizeClassConfig};
pub use error::{AllocError, AllocResult, ConfigError, ConfigResult};
pub use memory::{
    Allocator, AllocatorStats, BlockHandle, FixedBlockPool, PoolId, PoolState, PoolStats,
    SizeClass,
};
pub use sync::SharedAllocator;
