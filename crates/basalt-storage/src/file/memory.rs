//! In-memory block store for tests and benchmarks.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use basalt_common::types::BlockId;
use parking_lot::Mutex;

use super::error::{IoError, IoResult};
use super::store::BlockStore;

/// Block store that keeps every file as a vector of blocks in memory.
///
/// Nothing survives the process, but reads and writes follow the same
/// contract as [`FileManager`](super::FileManager): writing past the end
/// of a file extends it with zeroed blocks, and reading past the end
/// yields zeros.
pub struct MemoryStore {
    block_size: usize,
    files: Mutex<HashMap<String, Vec<Box<[u8]>>>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store with the given block size.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            files: Mutex::new(HashMap::new()),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Returns the number of blocks read so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of blocks written or appended so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns a copy of a stored block, or `None` if it was never written.
    pub fn snapshot(&self, block: &BlockId) -> Option<Vec<u8>> {
        let files = self.files.lock();
        files
            .get(block.file_name())
            .and_then(|blocks| blocks.get(usize::try_from(block.number()).ok()?))
            .map(|data| data.to_vec())
    }

    fn check_len(&self, len: usize) -> IoResult<()> {
        if len == self.block_size {
            Ok(())
        } else {
            Err(IoError::block_size_mismatch(self.block_size, len))
        }
    }
}

impl BlockStore for MemoryStore {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read_block(&self, block: &BlockId, buf: &mut [u8]) -> IoResult<()> {
        self.check_len(buf.len())?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        match self.snapshot(block) {
            Some(data) => buf.copy_from_slice(&data),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_block(&self, block: &BlockId, buf: &[u8]) -> IoResult<()> {
        self.check_len(buf.len())?;
        let index = usize::try_from(block.number()).map_err(|_| {
            IoError::from(io::Error::new(
                io::ErrorKind::InvalidInput,
                "block number out of range",
            ))
        })?;

        let mut files = self.files.lock();
        let blocks = files.entry(block.file_name().to_string()).or_default();
        while blocks.len() <= index {
            blocks.push(vec![0u8; self.block_size].into_boxed_slice());
        }
        blocks[index].copy_from_slice(buf);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn append_block(&self, file_name: &str, buf: &[u8]) -> IoResult<BlockId> {
        self.check_len(buf.len())?;

        let mut files = self.files.lock();
        let blocks = files.entry(file_name.to_string()).or_default();
        blocks.push(buf.to_vec().into_boxed_slice());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(BlockId::new(file_name, blocks.len() as u64 - 1))
    }

    fn block_count(&self, file_name: &str) -> IoResult<u64> {
        let files = self.files.lock();
        Ok(files.get(file_name).map_or(0, |blocks| blocks.len() as u64))
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("block_size", &self.block_size)
            .field("files", &self.files.lock().len())
            .field("reads", &self.reads())
            .field("writes", &self.writes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_sequential_numbers() {
        let store = MemoryStore::new(8);
        let a = store.append_block("f", &[1; 8]).unwrap();
        let b = store.append_block("f", &[2; 8]).unwrap();
        let c = store.append_block("g", &[3; 8]).unwrap();

        assert_eq!(a.number(), 0);
        assert_eq!(b.number(), 1);
        assert_eq!(c, BlockId::new("g", 0));
        assert_eq!(store.block_count("f").unwrap(), 2);
        assert_eq!(store.writes(), 3);
    }

    #[test]
    fn test_write_extends_file() {
        let store = MemoryStore::new(4);
        store.write_block(&BlockId::new("f", 2), &[7; 4]).unwrap();

        assert_eq!(store.block_count("f").unwrap(), 3);
        assert_eq!(store.snapshot(&BlockId::new("f", 1)), Some(vec![0; 4]));
        assert_eq!(store.snapshot(&BlockId::new("f", 2)), Some(vec![7; 4]));
    }

    #[test]
    fn test_read_missing_block_is_zeroed() {
        let store = MemoryStore::new(4);
        let mut buf = [9u8; 4];
        store.read_block(&BlockId::new("nope", 0), &mut buf).unwrap();
        assert_eq!(buf, [0; 4]);
        assert_eq!(store.reads(), 1);
    }

    #[test]
    fn test_wrong_buffer_size() {
        let store = MemoryStore::new(4);
        let err = store.append_block("f", &[0; 3]).unwrap_err();
        assert!(matches!(
            err,
            IoError::BlockSizeMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }
}
