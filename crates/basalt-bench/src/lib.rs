//! Basalt Performance Benchmarks
//!
//! This crate contains benchmarks for the buffer pool:
//! - Pin/unpin of resident blocks
//! - Access patterns that force eviction
//! - Contention between threads sharing a pool
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p basalt-bench
//! ```

pub mod utils;
