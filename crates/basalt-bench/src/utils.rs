//! Benchmark utilities and helpers.

use std::sync::Arc;
use std::time::Duration;

use basalt_common::types::BlockId;
use basalt_storage::buffer::{BufferConfig, BufferManager, BufferResult};
use basalt_storage::file::MemoryStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Block size used by benchmark pools.
pub const BENCH_BLOCK_SIZE: usize = 4096;

/// File name used for benchmark blocks.
pub const BENCH_FILE: &str = "bench.tbl";

/// Creates a buffer manager over an in-memory store.
pub fn memory_pool(frames: usize) -> BufferResult<(BufferManager, Arc<MemoryStore>)> {
    let store = Arc::new(MemoryStore::new(BENCH_BLOCK_SIZE));
    let config = BufferConfig::new(frames)
        .with_block_size(BENCH_BLOCK_SIZE)
        .with_max_wait(Duration::from_secs(10));
    let manager = BufferManager::new(config, store.clone())?;
    Ok((manager, store))
}

/// Generates `count` block ids cycling through `0..blocks`.
pub fn sequential_blocks(count: usize, blocks: u64) -> Vec<BlockId> {
    (0..count as u64)
        .map(|i| BlockId::new(BENCH_FILE, i % blocks))
        .collect()
}

/// Generates `count` uniformly random block ids in `0..blocks`.
pub fn random_blocks(count: usize, blocks: u64) -> Vec<BlockId> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| BlockId::new(BENCH_FILE, rng.gen_range(0..blocks)))
        .collect()
}

/// Generates block ids where `hot_ratio` of accesses go to the first
/// `hot` blocks and the rest spread over `0..blocks`.
pub fn skewed_blocks(count: usize, blocks: u64, hot: u64, hot_ratio: f64) -> Vec<BlockId> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            let number = if rng.gen_bool(hot_ratio) {
                rng.gen_range(0..hot)
            } else {
                rng.gen_range(0..blocks)
            };
            BlockId::new(BENCH_FILE, number)
        })
        .collect()
}
