//! # Allocator Error Types
//!
//! All errors that can occur while configuring or using the allocator.

use thiserror::Error;

use crate::memory::SizeClass;

/// Errors reported by the allocation paths that return `Result`.
///
/// The plain [`Allocator::allocate`](crate::Allocator::allocate) path folds
/// these into `None`; [`Allocator::try_allocate`](crate::Allocator::try_allocate)
/// reports which failure occurred.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// Requested size exceeds the largest supported class.
    #[error("unsupported size: requested {requested} bytes, largest class holds {max}")]
    UnsupportedSize {
        /// The requested size in bytes.
        requested: usize,
        /// Block size of the largest class.
        max: usize,
    },

    /// The selected pool has no carved or reclaimed block left.
    #[error("{class} pool out of blocks (capacity {capacity})")]
    OutOfBlocks {
        /// The class that was exhausted.
        class: SizeClass,
        /// Capacity of that class.
        capacity: usize,
    },

    /// A typed payload does not fit in the block.
    #[error("payload of {size} bytes does not fit in a {block_size}-byte block")]
    PayloadTooLarge {
        /// Size of the payload type.
        size: usize,
        /// Block size of the owning pool.
        block_size: usize,
    },

    /// The handle is free, foreign, or predates the last reset.
    #[error("handle does not refer to a live block")]
    StaleHandle,
}

/// Result type for allocation operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Errors raised while building pools from configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Block size must be non-zero.
    #[error("invalid block size: {0}")]
    InvalidBlockSize(usize),

    /// Capacity must be non-zero and addressable by a 32-bit slot index.
    #[error("invalid capacity: {0}")]
    InvalidCapacity(usize),

    /// The small class must hold strictly fewer bytes than the large class.
    #[error("small class ({small} bytes) must be smaller than large class ({large} bytes)")]
    ClassOrder {
        /// Small class block size.
        small: usize,
        /// Large class block size.
        large: usize,
    },

    /// The TOML document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
