//! Test fixtures.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use basalt_storage::buffer::{BufferConfig, BufferManager, BufferResult};
use basalt_storage::file::{BlockStore, FileManager, MemoryStore};
use tracing_subscriber::EnvFilter;

/// Block size used by test pools. Small enough to keep fixtures cheap.
pub const TEST_BLOCK_SIZE: usize = 400;

/// Installs a test-friendly tracing subscriber, once per process.
///
/// Honors `RUST_LOG`; defaults to warnings only.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Returns a pool configuration for tests.
pub fn test_config(frames: usize, max_wait: Duration) -> BufferConfig {
    BufferConfig::new(frames)
        .with_block_size(TEST_BLOCK_SIZE)
        .with_max_wait(max_wait)
}

/// Creates a buffer manager over a fresh in-memory store.
///
/// The store is returned as well so tests can inspect what was written.
pub fn memory_manager(
    frames: usize,
    max_wait: Duration,
) -> BufferResult<(BufferManager, Arc<MemoryStore>)> {
    init_tracing();
    let store = Arc::new(MemoryStore::new(TEST_BLOCK_SIZE));
    let manager = BufferManager::new(test_config(frames, max_wait), store.clone())?;
    Ok((manager, store))
}

/// Creates a buffer manager over files in `dir`.
pub fn file_manager(
    dir: &Path,
    frames: usize,
    max_wait: Duration,
) -> BufferResult<(BufferManager, Arc<FileManager>)> {
    init_tracing();
    let store = Arc::new(FileManager::open(dir, TEST_BLOCK_SIZE)?);
    let manager = BufferManager::new(test_config(frames, max_wait), store.clone())?;
    Ok((manager, store))
}

/// Fills `count` blocks of `file_name` so each starts with its own number.
pub fn seed_blocks(store: &dyn BlockStore, file_name: &str, count: u64) -> BufferResult<()> {
    let mut data = vec![0u8; store.block_size()];
    for n in 0..count {
        data[..8].copy_from_slice(&n.to_le_bytes());
        store.append_block(file_name, &data)?;
    }
    Ok(())
}

/// Reads the block number written by [`seed_blocks`] from frame data.
pub fn seeded_number(data: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[..8]);
    u64::from_le_bytes(raw)
}
