//! Buffer manager for Basalt.
//!
//! The buffer manager caches disk blocks in a fixed number of in-memory
//! frames and arbitrates access to them between threads:
//!
//! - **Pin/Unpin**: A pinned frame stays resident and keeps its block
//! - **Lazy Frames**: Frames are constructed on first use, up to capacity
//! - **Dirty Tracking**: Frames remember the last modifying transaction and
//!   the LSN of its log record; the log is forced before write-back
//! - **Eviction Policy**: Most recently modified unpinned frame goes first
//! - **Bounded Waiting**: A pin that finds every frame pinned waits for an
//!   unpin, up to a configured limit
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       BufferManager                             │
//! │        Mutex<PoolCore> + Condvar (frame released)               │
//! │  ┌─────────────────────────────────────────────────────────────┐ │
//! │  │                    Block Table                              │ │
//! │  │              HashMap<BlockId, FrameId>                      │ │
//! │  └─────────────────────────────────────────────────────────────┘ │
//! │                              │                                  │
//! │                              ▼                                  │
//! │  ┌─────────────────────────────────────────────────────────────┐ │
//! │  │              Frame Array (grows to capacity)                │ │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐     ┌ ─ ─ ─ ─ ┐      │ │
//! │  │  │ Frame 0 │ │ Frame 1 │ │ Frame 2 │ ...   unallocated      │ │
//! │  │  │ ─────── │ │ ─────── │ │ ─────── │     └ ─ ─ ─ ─ ┘      │ │
//! │  │  │ block   │ │ block   │ │ block   │                       │ │
//! │  │  │ data[]  │ │ data[]  │ │ data[]  │                       │ │
//! │  │  │ txn,lsn │ │ txn,lsn │ │ txn,lsn │                       │ │
//! │  │  │ pin_cnt │ │ pin_cnt │ │ pin_cnt │                       │ │
//! │  │  └─────────┘ └─────────┘ └─────────┘                       │ │
//! │  └─────────────────────────────────────────────────────────────┘ │
//! │                              │                                  │
//! │                              ▼                                  │
//! │  ┌─────────────────────────────────────────────────────────────┐ │
//! │  │                   LSN Replacer                              │ │
//! │  │        (largest LSN among unpinned frames)                  │ │
//! │  └─────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use basalt_common::types::{BlockId, Lsn, TxnId};
//! use basalt_storage::buffer::{BufferConfig, BufferManager};
//! use basalt_storage::file::FileManager;
//! use std::sync::Arc;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileManager::open("/tmp/basalt", 4096)?);
//!     let buffers = BufferManager::new(BufferConfig::new(8), store)?;
//!
//!     // Pin a block (reads from disk if not resident)
//!     let frame = buffers.pin(&BlockId::new("accounts.tbl", 3))?;
//!
//!     // Modify it and record who did, under which log record
//!     frame.write_data()[0] = 1;
//!     frame.set_modified(TxnId::new(7), Lsn::new(42));
//!
//!     // Release the pin; the block stays cached until evicted
//!     buffers.unpin(&frame)?;
//!     buffers.flush_all(TxnId::new(7))?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod eviction;
mod frame;
mod manager;
mod pool;

use std::fmt;

use basalt_common::types::{BlockId, Lsn, TxnId};

pub use config::BufferConfig;
pub use error::{BufferError, BufferResult};
pub use eviction::LsnReplacer;
pub use frame::{BufferFrame, FrameId};
pub use manager::BufferManager;
pub use pool::{FlushBatch, PoolCore};

/// Snapshot of one frame for monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame index.
    pub frame_id: FrameId,
    /// Resident block, if any.
    pub block: Option<BlockId>,
    /// Current pin count.
    pub pin_count: u32,
    /// Last modifying transaction, if the frame is dirty.
    pub modified_by: Option<TxnId>,
    /// LSN of the latest logged modification.
    pub lsn: Lsn,
    /// Total pins since construction.
    pub pins: u64,
    /// Total unpins since construction.
    pub unpins: u64,
    /// Blocks read into this frame.
    pub reads: u64,
    /// Blocks written from this frame.
    pub writes: u64,
}

/// Statistics for buffer pool monitoring.
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    /// Total number of frames.
    pub capacity: usize,
    /// Frames not currently pinned, constructed or not.
    pub available: usize,
    /// Frames not yet constructed.
    pub unallocated: usize,
    /// Pin requests that had to wait for a frame.
    pub pin_waits: u64,
    /// Pin requests that timed out.
    pub pin_timeouts: u64,
    /// Constructed frames, in index order.
    pub frames: Vec<FrameStats>,
}

impl PoolReport {
    /// Returns the number of pinned frames.
    pub fn pinned_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.pin_count > 0).count()
    }

    /// Returns the number of dirty frames.
    pub fn dirty_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.modified_by.is_some()).count()
    }
}

impl fmt::Display for PoolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "buffer pool: {} frames, {} available, {} unallocated, {} waits, {} timeouts",
            self.capacity, self.available, self.unallocated, self.pin_waits, self.pin_timeouts
        )?;
        writeln!(
            f,
            "{:>5}  {:<28} {:>4} {:>6} {:>8} {:>7} {:>7} {:>7} {:>7}",
            "frame", "block", "pins", "txn", "lsn", "pinned", "unpins", "reads", "writes"
        )?;
        for s in &self.frames {
            let block = s.block.as_ref().map_or_else(|| "-".to_string(), |b| b.to_string());
            let txn = s.modified_by.map_or_else(|| "-".to_string(), |t| t.to_string());
            writeln!(
                f,
                "{:>5}  {:<28} {:>4} {:>6} {:>8} {:>7} {:>7} {:>7} {:>7}",
                s.frame_id.index(),
                block,
                s.pin_count,
                txn,
                s.lsn.to_string(),
                s.pins,
                s.unpins,
                s.reads,
                s.writes
            )?;
        }
        Ok(())
    }
}
