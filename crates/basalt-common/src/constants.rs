//! System-wide constants for Basalt.

use std::time::Duration;

// =============================================================================
// Block Constants
// =============================================================================

/// Default block size in bytes (4 KB).
///
/// Every file managed by the block store is an array of blocks of this size.
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024;

/// Smallest block size accepted by the storage layer.
pub const MIN_BLOCK_SIZE: usize = 64;

// =============================================================================
// Buffer Pool Constants
// =============================================================================

/// Default number of frames in the buffer pool.
pub const DEFAULT_BUFFER_FRAMES: usize = 8;

/// Default time a pin request waits for a frame before aborting.
pub const DEFAULT_PIN_WAIT: Duration = Duration::from_secs(10);
