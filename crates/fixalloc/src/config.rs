//! # Allocator Configuration
//!
//! Size-class parameters, loaded once at startup.
//!
//! ## Example
//!
//! ```toml
//! [small]
//! block_size = 15
//! capacity = 2000
//!
//! [large]
//! block_size = 180
//! capacity = 500
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Block size of the default small class.
pub const SMALL_BLOCK_SIZE: usize = 15;
/// Capacity of the default small class.
pub const SMALL_CAPACITY: u32 = 2000;
/// Block size of the default large class.
pub const LARGE_BLOCK_SIZE: usize = 180;
/// Capacity of the default large class.
pub const LARGE_CAPACITY: u32 = 500;

/// Parameters of one size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeClassConfig {
    /// Largest payload, in bytes, a block of this class holds.
    pub block_size: usize,
    /// Number of blocks reserved for this class.
    pub capacity: usize,
}

impl SizeClassConfig {
    /// Creates a size class configuration.
    #[inline]
    #[must_use]
    pub const fn new(block_size: usize, capacity: usize) -> Self {
        Self {
            block_size,
            capacity,
        }
    }

    /// Checks that the class can back a pool.
    ///
    /// # Errors
    ///
    /// Returns error if the block size is zero, or the capacity is zero or
    /// exceeds the 32-bit slot index range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize(self.block_size));
        }
        if self.capacity == 0 || u32::try_from(self.capacity).is_err() {
            return Err(ConfigError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }
}

/// Configuration for both size classes of an [`Allocator`](crate::Allocator).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocatorConfig {
    /// The small class; requests up to its block size land here.
    pub small: SizeClassConfig,
    /// The large class; requests above the small block size land here.
    pub large: SizeClassConfig,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            small: SizeClassConfig::new(SMALL_BLOCK_SIZE, SMALL_CAPACITY as usize),
            large: SizeClassConfig::new(LARGE_BLOCK_SIZE, LARGE_CAPACITY as usize),
        }
    }
}

impl AllocatorConfig {
    /// Parses and validates a TOML document.
    ///
    /// Missing tables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or fails [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or its contents are invalid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks both classes and their ordering.
    ///
    /// # Errors
    ///
    /// Returns error if either class is invalid or the small class is not
    /// strictly smaller than the large class.
    pub fn validate(&self) -> ConfigResult<()> {
        self.small.validate()?;
        self.large.validate()?;
        if self.small.block_size >= self.large.block_size {
            return Err(ConfigError::ClassOrder {
                small: self.small.block_size,
                large: self.large.block_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classes() {
        let config = AllocatorConfig::default();
        assert_eq!(config.small, SizeClassConfig::new(15, 2000));
        assert_eq!(config.large, SizeClassConfig::new(180, 500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_document() {
        let config = AllocatorConfig::from_toml_str(
            r"
            [small]
            block_size = 32
            capacity = 64

            [large]
            block_size = 256
            capacity = 8
            ",
        )
        .unwrap();

        assert_eq!(config.small, SizeClassConfig::new(32, 64));
        assert_eq!(config.large, SizeClassConfig::new(256, 8));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AllocatorConfig {
            small: SizeClassConfig::new(24, 128),
            large: SizeClassConfig::new(512, 16),
        };

        let source = toml::to_string(&config).unwrap();
        assert!(source.contains("[small]"));
        assert_eq!(AllocatorConfig::from_toml_str(&source).unwrap(), config);

        let defaults = toml::to_string(&AllocatorConfig::default()).unwrap();
        assert_eq!(
            AllocatorConfig::from_toml_str(&defaults).unwrap(),
            AllocatorConfig::default()
        );
    }

    #[test]
    fn test_missing_table_uses_default() {
        let config = AllocatorConfig::from_toml_str(
            r"
            [large]
            block_size = 200
            capacity = 10
            ",
        )
        .unwrap();

        assert_eq!(config.small, SizeClassConfig::new(15, 2000));
        assert_eq!(config.large.block_size, 200);
    }

    #[test]
    fn test_rejects_zero_values() {
        let err = AllocatorConfig::from_toml_str(
            r"
            [small]
            block_size = 0
            capacity = 4
            ",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBlockSize(0)));

        let err = SizeClassConfig::new(8, 0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCapacity(0)));
    }

    #[test]
    fn test_rejects_inverted_classes() {
        let config = AllocatorConfig {
            small: SizeClassConfig::new(180, 4),
            large: SizeClassConfig::new(15, 4),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ClassOrder { small: 180, large: 15 })
        ));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = AllocatorConfig::from_toml_str(
            r"
            [small]
            block_size = 15
            capacity = 10
            alignment = 64
            ",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AllocatorConfig::from_toml_file("/nonexistent/fixalloc.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
