//! # Memory Management
//!
//! Fixed-block pools and the two-class allocator built on them.
//!
//! ## Design Philosophy
//!
//! All memory is reserved once, when a pool is built. After that:
//! - No heap allocations
//! - No growth, no compaction, no relocation
//! - Every operation completes in constant time

mod allocator;
mod pool;

pub use allocator::{Allocator, AllocatorStats, SizeClass};
pub use pool::{BlockHandle, FixedBlockPool, PoolId, PoolState, PoolStats};
