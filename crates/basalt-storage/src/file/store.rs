//! Collaborator traits consumed by the buffer pool.

use basalt_common::types::{BlockId, Lsn};

use super::error::IoResult;

/// Durable, fixed-size block storage.
///
/// Every buffer passed in or out must be exactly [`block_size`] bytes long.
/// Implementations are shared between threads; the buffer pool calls them
/// while holding its own lock, so they must not call back into the pool.
///
/// [`block_size`]: BlockStore::block_size
pub trait BlockStore: Send + Sync {
    /// Returns the size in bytes of every block in this store.
    fn block_size(&self) -> usize;

    /// Reads `block` into `buf`.
    ///
    /// A block past the end of its file reads as zeros.
    fn read_block(&self, block: &BlockId, buf: &mut [u8]) -> IoResult<()>;

    /// Writes `buf` to `block`, returning once the data is durable.
    fn write_block(&self, block: &BlockId, buf: &[u8]) -> IoResult<()>;

    /// Appends `buf` as a new block at the end of `file_name` and returns
    /// the identity of the new block.
    fn append_block(&self, file_name: &str, buf: &[u8]) -> IoResult<BlockId>;

    /// Returns the number of blocks currently in `file_name`.
    fn block_count(&self, file_name: &str) -> IoResult<u64>;
}

/// Initializes the contents of a block that is about to be appended.
///
/// Record and index managers implement this to lay out an empty page in
/// their own format. Any `Fn(&mut [u8])` closure is a formatter.
pub trait PageFormatter {
    /// Writes the initial contents of a new block into `data`.
    fn format(&self, data: &mut [u8]);
}

impl<F> PageFormatter for F
where
    F: Fn(&mut [u8]),
{
    fn format(&self, data: &mut [u8]) {
        self(data);
    }
}

/// Formatter that leaves a new block filled with zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroFormatter;

impl PageFormatter for ZeroFormatter {
    fn format(&self, data: &mut [u8]) {
        data.fill(0);
    }
}

/// Forces the write-ahead log to disk.
///
/// Before the buffer pool writes a modified block it asks the log to make
/// every record up to the block's LSN durable.
///
/// Implementations number their records from [`Lsn::FIRST`] (1). LSN 0 is
/// reserved for "no record": a modification stamped with it is treated as
/// unlogged, and a frame holding only such modifications flushes with
/// `lsn == Lsn::INVALID`.
pub trait LogFlusher: Send + Sync {
    /// Makes all log records with LSN `<= lsn` durable. Called with
    /// [`Lsn::INVALID`] when the block carries no logged change.
    fn flush(&self, lsn: Lsn) -> IoResult<()>;
}

/// Log flusher for pools that run without a write-ahead log.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLog;

impl LogFlusher for NoopLog {
    fn flush(&self, _lsn: Lsn) -> IoResult<()> {
        Ok(())
    }
}
