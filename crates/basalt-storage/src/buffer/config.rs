//! Buffer pool configuration.

use std::time::Duration;

use basalt_common::constants::{
    DEFAULT_BLOCK_SIZE, DEFAULT_BUFFER_FRAMES, DEFAULT_PIN_WAIT, MIN_BLOCK_SIZE,
};
use serde::{Deserialize, Serialize};

/// Configuration for the buffer pool.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use basalt_storage::buffer::BufferConfig;
///
/// let config = BufferConfig::new(64).with_max_wait(Duration::from_secs(2));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Number of frames in the pool. Fixed for the lifetime of the pool.
    pub num_frames: usize,
    /// Block size in bytes. Must match the block store.
    pub block_size: usize,
    /// How long a pin request waits for a frame before aborting.
    #[serde(with = "humantime_serde")]
    pub max_wait: Duration,
}

impl BufferConfig {
    /// Creates a new configuration with the specified number of frames.
    pub fn new(num_frames: usize) -> Self {
        Self {
            num_frames,
            block_size: DEFAULT_BLOCK_SIZE,
            max_wait: DEFAULT_PIN_WAIT,
        }
    }

    /// Sets the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets the maximum time a pin request may wait.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Returns the memory held by frame contents once the pool is full.
    pub fn memory_usage(&self) -> usize {
        self.num_frames * self.block_size
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_frames == 0 {
            return Err("num_frames must be > 0");
        }
        if self.block_size < MIN_BLOCK_SIZE {
            return Err("block_size is below the minimum block size");
        }
        if self.max_wait.is_zero() {
            return Err("max_wait must be > 0");
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_FRAMES)
    }
}

/// Serde helper for Duration using humantime format.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        s.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
