//! Buffer pool core.
//!
//! `PoolCore` owns the frame array, the block table and the availability
//! counters. It never blocks and is not synchronized; the
//! [`BufferManager`](super::BufferManager) wraps it in a single mutex and
//! adds the bounded wait for a free frame.
//!
//! State kept consistent by every operation:
//!
//! - `block_table` has exactly one entry per frame with a resident block,
//!   pointing at that frame.
//! - `available` equals the number of frames with pin count 0, plus the
//!   slots not yet constructed.
//! - Frames are constructed lazily, one per slot, until `capacity` is
//!   reached; after that they are only reassigned.

use std::collections::HashMap;
use std::sync::Arc;

use basalt_common::types::{BlockId, TxnId};
use tracing::{debug, error, trace};

use super::error::{BufferError, BufferResult};
use super::eviction::LsnReplacer;
use super::frame::{BufferFrame, FrameId};
use super::PoolReport;
use crate::file::{BlockStore, LogFlusher, PageFormatter};

/// Pin/unpin bookkeeping for a fixed number of frames.
pub struct PoolCore {
    /// Maximum number of frames.
    capacity: usize,
    /// Constructed frames, indexed by `FrameId`.
    frames: Vec<Arc<BufferFrame>>,
    /// Block table: maps resident BlockId -> FrameId.
    block_table: HashMap<BlockId, FrameId>,
    /// Frame slots not constructed yet.
    unallocated: usize,
    /// Frames with pin count 0, including unconstructed slots.
    available: usize,
    /// Victim selection policy.
    replacer: LsnReplacer,
    /// Block storage.
    store: Arc<dyn BlockStore>,
    /// Write-ahead log, forced before dirty frames are written.
    log: Arc<dyn LogFlusher>,
}

impl PoolCore {
    /// Creates an empty pool of `capacity` frames over `store`.
    pub fn new(capacity: usize, store: Arc<dyn BlockStore>, log: Arc<dyn LogFlusher>) -> Self {
        Self {
            capacity,
            frames: Vec::with_capacity(capacity),
            block_table: HashMap::with_capacity(capacity),
            unallocated: capacity,
            available: capacity,
            replacer: LsnReplacer::new(),
            store,
            log,
        }
    }

    /// Returns the number of frames the pool may hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of unpinned frames, counting unconstructed slots.
    pub fn available(&self) -> usize {
        self.available
    }

    /// Returns true if `block` is resident.
    pub fn contains(&self, block: &BlockId) -> bool {
        self.block_table.contains_key(block)
    }

    /// Returns the frame holding `block` without pinning it.
    pub fn frame_for(&self, block: &BlockId) -> Option<Arc<BufferFrame>> {
        self.block_table
            .get(block)
            .map(|frame_id| Arc::clone(&self.frames[frame_id.index()]))
    }

    /// Pins a frame to `block`, loading the block if it is not resident.
    ///
    /// Returns `Ok(None)` without touching any state if every frame is
    /// pinned.
    pub fn pin(&mut self, block: &BlockId) -> BufferResult<Option<Arc<BufferFrame>>> {
        let frame = match self.frame_for(block) {
            Some(frame) => frame,
            None => {
                let Some(frame) = self.choose_victim()? else {
                    return Ok(None);
                };
                self.evict(&frame)?;
                frame.load(block, self.store.as_ref())?;
                self.block_table.insert(block.clone(), frame.frame_id());
                frame
            }
        };

        self.claim(&frame);
        trace!(block = %block, frame = frame.frame_id().index(), pins = frame.pin_count(), "pinned");
        Ok(Some(frame))
    }

    /// Appends a new block to `file_name`, formatted by `formatter`, and pins
    /// a frame to it.
    ///
    /// Returns `Ok(None)` without appending anything if every frame is
    /// pinned.
    pub fn pin_new(
        &mut self,
        file_name: &str,
        formatter: &dyn PageFormatter,
    ) -> BufferResult<Option<Arc<BufferFrame>>> {
        let Some(frame) = self.choose_victim()? else {
            return Ok(None);
        };
        self.evict(&frame)?;
        let block = frame.load_new(file_name, formatter, self.store.as_ref())?;

        if self.block_table.contains_key(&block) {
            // Back to an empty, unmapped frame.
            frame.clear();
            error!(block = %block, "appended block is already resident");
            return Err(BufferError::inconsistent(format!(
                "new block {block} is already mapped to a frame"
            )));
        }
        self.block_table.insert(block.clone(), frame.frame_id());

        self.claim(&frame);
        trace!(block = %block, frame = frame.frame_id().index(), "pinned new block");
        Ok(Some(frame))
    }

    /// Releases one pin on `frame`.
    ///
    /// Returns true if the frame became unpinned, i.e. one more frame is
    /// now available.
    pub fn unpin(&mut self, frame: &BufferFrame) -> BufferResult<bool> {
        let frame_id = frame.frame_id();
        let owned = self
            .frames
            .get(frame_id.index())
            .is_some_and(|own| std::ptr::eq(own.as_ref(), frame));
        if !owned {
            return Err(BufferError::ForeignFrame {
                frame_id: frame_id.index(),
            });
        }

        if frame.pin_count() == 1 && self.available >= self.capacity {
            error!(frame = frame_id.index(), "available count already at capacity");
            return Err(BufferError::inconsistent(format!(
                "unpinning frame {} would make {} of {} frames available",
                frame_id.index(),
                self.available + 1,
                self.capacity
            )));
        }

        let Some(remaining) = frame.unpin() else {
            error!(frame = frame_id.index(), "unpin of an unpinned frame");
            return Err(BufferError::NotPinned {
                frame_id: frame_id.index(),
            });
        };
        trace!(frame = frame_id.index(), pins = remaining, "unpinned");

        if remaining == 0 {
            self.available += 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Collects the frames last modified by `txn` for write-back.
    ///
    /// The batch holds no lock; callers sharing the pool write it after
    /// releasing theirs.
    pub fn flush_batch(&self, txn: TxnId) -> FlushBatch {
        FlushBatch {
            txn,
            frames: self
                .frames
                .iter()
                .filter(|frame| frame.modified_by() == Some(txn))
                .cloned()
                .collect(),
            store: Arc::clone(&self.store),
            log: Arc::clone(&self.log),
        }
    }

    /// Writes back every frame last modified by `txn` and clears its dirty
    /// marker. Pin counts are not affected.
    ///
    /// Returns the number of frames written.
    pub fn flush_all(&self, txn: TxnId) -> BufferResult<usize> {
        self.flush_batch(txn).write()
    }

    /// Returns per-frame statistics.
    pub fn report(&self) -> PoolReport {
        PoolReport {
            capacity: self.capacity,
            available: self.available,
            unallocated: self.unallocated,
            pin_waits: 0,
            pin_timeouts: 0,
            frames: self.frames.iter().map(|frame| frame.stats()).collect(),
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Picks an unpinned frame to (re)assign.
    ///
    /// Constructing a frame for an unused slot takes priority over
    /// evicting a resident block.
    fn choose_victim(&mut self) -> BufferResult<Option<Arc<BufferFrame>>> {
        if self.unallocated > 0 {
            let frame_id = FrameId::new(self.frames.len());
            let frame = Arc::new(BufferFrame::new(frame_id, self.store.block_size()));
            self.frames.push(Arc::clone(&frame));
            self.unallocated -= 1;
            return Ok(Some(frame));
        }

        let Some(frame_id) = self.replacer.find_victim(&self.frames) else {
            return Ok(None);
        };
        let frame = Arc::clone(&self.frames[frame_id.index()]);
        if frame.is_pinned() {
            error!(frame = frame_id.index(), "replacer chose a pinned frame");
            return Err(BufferError::inconsistent(format!(
                "victim frame {} is pinned",
                frame_id.index()
            )));
        }
        Ok(Some(frame))
    }

    /// Empties a victim frame: writes back its contents if dirty and drops
    /// its block-table entry.
    ///
    /// If the write-back fails nothing has changed.
    fn evict(&mut self, frame: &BufferFrame) -> BufferResult<()> {
        frame.flush(self.store.as_ref(), self.log.as_ref())?;

        if let Some(old) = frame.block() {
            match self.block_table.get(&old).copied() {
                Some(frame_id) if frame_id == frame.frame_id() => {
                    self.block_table.remove(&old);
                }
                other => {
                    error!(block = %old, "block table does not point at the evicted frame");
                    return Err(BufferError::inconsistent(format!(
                        "block {old} maps to {other:?}, expected {:?}",
                        frame.frame_id()
                    )));
                }
            }
            debug!(block = %old, frame = frame.frame_id().index(), lsn = %frame.lsn(), "evicted");
        }
        frame.clear();
        Ok(())
    }

    /// Adds one pin to `frame`, consuming an available slot if it was free.
    fn claim(&mut self, frame: &BufferFrame) {
        if !frame.is_pinned() {
            self.available -= 1;
        }
        frame.pin();
    }
}

/// Frames last modified by one transaction, collected under the pool lock
/// and written back after it is released.
pub struct FlushBatch {
    txn: TxnId,
    frames: Vec<Arc<BufferFrame>>,
    store: Arc<dyn BlockStore>,
    log: Arc<dyn LogFlusher>,
}

impl FlushBatch {
    /// Returns the number of frames collected.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if no frame was collected.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Writes back every collected frame that is still modified by the
    /// batch's transaction. A frame that was reassigned or flushed by
    /// someone else in the meantime is skipped.
    ///
    /// Returns the number of frames written.
    pub fn write(self) -> BufferResult<usize> {
        let mut flushed = 0;
        for frame in &self.frames {
            if frame.flush_for(self.txn, self.store.as_ref(), self.log.as_ref())? {
                flushed += 1;
            }
        }
        debug!(txn = %self.txn, flushed, "flushed frames for transaction");
        Ok(flushed)
    }
}

impl std::fmt::Debug for FlushBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushBatch")
            .field("txn", &self.txn)
            .field("frames", &self.frames.len())
            .finish()
    }
}

impl std::fmt::Debug for PoolCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolCore")
            .field("capacity", &self.capacity)
            .field("constructed", &self.frames.len())
            .field("resident", &self.block_table.len())
            .field("available", &self.available)
            .finish()
    }
}
