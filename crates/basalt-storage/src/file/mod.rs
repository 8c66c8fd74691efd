//! Block I/O layer for Basalt.
//!
//! Database files are arrays of fixed-size blocks. This module defines the
//! collaborators the buffer pool talks to:
//!
//! - [`BlockStore`]: reads, writes and appends whole blocks
//! - [`PageFormatter`]: initializes the contents of a freshly appended block
//! - [`LogFlusher`]: forces the write-ahead log before a dirty block is written
//!
//! Two stores are provided: [`FileManager`], which keeps one OS file per
//! database file inside a directory, and [`MemoryStore`], which keeps blocks
//! in memory for tests and benchmarks.
//!
//! # Usage
//!
//! ```rust,no_run
//! use basalt_common::types::BlockId;
//! use basalt_storage::file::{BlockStore, FileManager};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileManager::open("/var/lib/basalt", 4096)?;
//!
//!     let data = vec![7u8; 4096];
//!     let block = store.append_block("students.tbl", &data)?;
//!
//!     let mut buf = vec![0u8; 4096];
//!     store.read_block(&block, &mut buf)?;
//!     assert_eq!(buf, data);
//!     Ok(())
//! }
//! ```

mod error;
mod manager;
mod memory;
mod store;

pub use error::{IoError, IoResult};
pub use manager::FileManager;
pub use memory::MemoryStore;
pub use store::{BlockStore, LogFlusher, NoopLog, PageFormatter, ZeroFormatter};
