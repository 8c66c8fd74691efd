//! Buffer frame - a slot in the buffer pool that holds one block.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use basalt_common::types::{BlockId, Lsn, TxnId};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::file::{BlockStore, IoResult, LogFlusher, PageFormatter};

use super::FrameStats;

/// Frame identifier - index into the buffer pool's frame array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Creates a new frame ID.
    #[inline]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for FrameId {
    fn from(id: usize) -> Self {
        Self::new(id)
    }
}

/// Diagnostic tallies kept per frame. Never reset, never consulted by the
/// pool when it makes a decision.
#[derive(Debug, Default)]
struct FrameCounters {
    pins: AtomicU64,
    unpins: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
}

/// A buffer frame holds the contents of at most one block.
///
/// Each frame has:
/// - A block-sized data buffer behind a read/write latch
/// - The identity of the resident block, if any
/// - A pin count; a pinned frame is never evicted or reassigned
/// - The transaction that last modified it and the LSN protecting that
///   modification
///
/// The pin count and the block identity only change while the owning
/// pool's lock is held. They are atomics so that a frame handle can be
/// shared with the caller that pinned it.
pub struct BufferFrame {
    /// Frame ID (index in the frame array).
    frame_id: FrameId,
    /// Block contents.
    data: RwLock<Vec<u8>>,
    /// Block currently resident (None if never assigned or a load failed).
    block: RwLock<Option<BlockId>>,
    /// Pin count (number of active claims).
    pin_count: AtomicU32,
    /// Last modifying transaction (INVALID when clean).
    modified_by: AtomicU64,
    /// LSN of the latest logged modification (INVALID when unset).
    lsn: AtomicU64,
    counters: FrameCounters,
}

impl BufferFrame {
    /// Creates a new empty buffer frame.
    pub fn new(frame_id: FrameId, block_size: usize) -> Self {
        Self {
            frame_id,
            data: RwLock::new(vec![0u8; block_size]),
            block: RwLock::new(None),
            pin_count: AtomicU32::new(0),
            modified_by: AtomicU64::new(TxnId::INVALID.as_u64()),
            lsn: AtomicU64::new(Lsn::INVALID.as_u64()),
            counters: FrameCounters::default(),
        }
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the block resident in this frame.
    pub fn block(&self) -> Option<BlockId> {
        self.block.read().clone()
    }

    /// Returns true if no block is resident.
    pub fn is_empty(&self) -> bool {
        self.block.read().is_none()
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Returns true if the frame is pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Records that `txn` modified this frame under log record `lsn`.
    ///
    /// Pass [`Lsn::INVALID`] (0) for a modification that was not logged;
    /// the frame keeps its previous LSN in that case. A log must therefore
    /// never hand out 0 as a real record's LSN, or the frame is ranked as
    /// unlogged by the replacer and its log is not forced on write-back.
    pub fn set_modified(&self, txn: TxnId, lsn: Lsn) {
        self.modified_by.store(txn.as_u64(), Ordering::Release);
        if lsn.is_valid() {
            self.lsn.fetch_max(lsn.as_u64(), Ordering::AcqRel);
        }
    }

    /// Returns the transaction that last modified this frame, if the
    /// modification has not been flushed yet.
    pub fn modified_by(&self) -> Option<TxnId> {
        let txn = TxnId::new(self.modified_by.load(Ordering::Acquire));
        txn.is_valid().then_some(txn)
    }

    /// Returns true if the frame holds changes not yet written to disk.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.modified_by().is_some()
    }

    /// Returns the LSN of the latest logged modification.
    #[inline]
    pub fn lsn(&self) -> Lsn {
        Lsn::new(self.lsn.load(Ordering::Acquire))
    }

    /// Returns a read lock on the block contents.
    #[inline]
    pub fn read_data(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.data.read()
    }

    /// Returns a write lock on the block contents.
    ///
    /// Callers that change the contents should also call
    /// [`set_modified`](Self::set_modified).
    #[inline]
    pub fn write_data(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.data.write()
    }

    /// Returns a snapshot of the diagnostic counters and state.
    pub fn stats(&self) -> FrameStats {
        FrameStats {
            frame_id: self.frame_id,
            block: self.block(),
            pin_count: self.pin_count(),
            modified_by: self.modified_by(),
            lsn: self.lsn(),
            pins: self.counters.pins.load(Ordering::Relaxed),
            unpins: self.counters.unpins.load(Ordering::Relaxed),
            reads: self.counters.reads.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
        }
    }

    // -------------------------------------------------------------------------
    // Pool-internal operations; the caller holds the pool lock.
    // -------------------------------------------------------------------------

    /// Increments the pin count and returns the new value.
    pub(super) fn pin(&self) -> u32 {
        self.counters.pins.fetch_add(1, Ordering::Relaxed);
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value, or `None`
    /// (leaving the frame untouched) if it was not pinned.
    pub(super) fn unpin(&self) -> Option<u32> {
        let old = self
            .pin_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .ok()?;
        self.counters.unpins.fetch_add(1, Ordering::Relaxed);
        Some(old - 1)
    }

    /// Writes the contents back if the frame is dirty, forcing the log first.
    ///
    /// On failure the frame stays dirty.
    pub(super) fn flush(&self, store: &dyn BlockStore, log: &dyn LogFlusher) -> IoResult<bool> {
        let data = self.data.read();
        self.write_back(&data, store, log)
    }

    /// Like [`flush`](Self::flush), but only if `txn` is still the last
    /// modifier. Safe to call without the pool lock: the data latch keeps
    /// the frame from being reloaded while it is written.
    pub(super) fn flush_for(
        &self,
        txn: TxnId,
        store: &dyn BlockStore,
        log: &dyn LogFlusher,
    ) -> IoResult<bool> {
        let data = self.data.read();
        if self.modified_by() != Some(txn) {
            return Ok(false);
        }
        self.write_back(&data, store, log)
    }

    /// Writes `data` to the resident block. The caller holds the data latch.
    fn write_back(
        &self,
        data: &[u8],
        store: &dyn BlockStore,
        log: &dyn LogFlusher,
    ) -> IoResult<bool> {
        // Read LSN and modifier before the block: `clear` resets them after it.
        let lsn = self.lsn();
        let Some(txn) = self.modified_by() else {
            return Ok(false);
        };
        let Some(block) = self.block() else {
            return Ok(false);
        };

        log.flush(lsn)?;
        store.write_block(&block, data)?;
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        // A modification by another transaction in the meantime keeps the frame dirty.
        let _ = self.modified_by.compare_exchange(
            txn.as_u64(),
            TxnId::INVALID.as_u64(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        Ok(true)
    }

    /// Detaches the frame from its block and forgets any modification.
    pub(super) fn clear(&self) {
        *self.block.write() = None;
        self.modified_by
            .store(TxnId::INVALID.as_u64(), Ordering::Release);
        self.lsn.store(Lsn::INVALID.as_u64(), Ordering::Release);
    }

    /// Reads `block` into this (cleared) frame and makes it resident.
    ///
    /// On failure the frame stays empty.
    pub(super) fn load(&self, block: &BlockId, store: &dyn BlockStore) -> IoResult<()> {
        store.read_block(block, &mut self.data.write())?;
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        *self.block.write() = Some(block.clone());
        Ok(())
    }

    /// Formats fresh contents, appends them to `file_name` and makes the new
    /// block resident in this (cleared) frame.
    ///
    /// On failure the frame stays empty.
    pub(super) fn load_new(
        &self,
        file_name: &str,
        formatter: &dyn PageFormatter,
        store: &dyn BlockStore,
    ) -> IoResult<BlockId> {
        let block = {
            let mut data = self.data.write();
            data.fill(0);
            formatter.format(&mut data);
            store.append_block(file_name, &data)?
        };
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        *self.block.write() = Some(block.clone());
        Ok(block)
    }
}

impl std::fmt::Debug for BufferFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferFrame")
            .field("frame_id", &self.frame_id)
            .field("block", &self.block())
            .field("pin_count", &self.pin_count())
            .field("modified_by", &self.modified_by())
            .field("lsn", &self.lsn())
            .finish()
    }
}
