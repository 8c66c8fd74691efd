//! File-backed block store.
//!
//! Each database file is a regular OS file inside the store's directory.
//! Handles are opened lazily on first use and kept open for the lifetime
//! of the manager.

use std::collections::HashMap;
use std::fs::{self, File as StdFile, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use basalt_common::types::BlockId;
use parking_lot::Mutex;
use tracing::debug;

use super::error::{IoError, IoResult};
use super::store::BlockStore;

/// Block store backed by files in a directory.
///
/// All handles sit behind one mutex: a seek followed by a read or write
/// must not interleave with another thread's seek on the same handle.
pub struct FileManager {
    /// Directory holding the database files.
    dir: PathBuf,
    /// Size of every block in bytes.
    block_size: usize,
    /// Open handles, keyed by file name.
    files: Mutex<HashMap<String, StdFile>>,
}

impl FileManager {
    /// Opens a block store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>, block_size: usize) -> IoResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        if block_size == 0 {
            return Err(IoError::from(io::Error::new(
                io::ErrorKind::InvalidInput,
                "block size must be non-zero",
            )));
        }
        fs::create_dir_all(&dir).map_err(|e| IoError::from_io_with_path(e, &dir))?;
        debug!(dir = %dir.display(), block_size, "opened block store");

        Ok(Self {
            dir,
            block_size,
            files: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the directory holding the database files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolves a file name to a path inside the store directory.
    fn path_for(&self, file_name: &str) -> IoResult<PathBuf> {
        let valid = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\']);
        if !valid {
            return Err(IoError::invalid_file_name(file_name));
        }
        Ok(self.dir.join(file_name))
    }

    /// Runs `op` against the handle for `file_name`, opening it if needed.
    fn with_file<R>(
        &self,
        file_name: &str,
        op: impl FnOnce(&mut StdFile) -> io::Result<R>,
    ) -> IoResult<R> {
        let mut files = self.files.lock();
        if !files.contains_key(file_name) {
            let path = self.path_for(file_name)?;
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)
                .map_err(|e| IoError::from_io_with_path(e, &path))?;
            files.insert(file_name.to_string(), file);
        }
        let file = files
            .get_mut(file_name)
            .ok_or_else(|| IoError::not_found(self.dir.join(file_name)))?;
        op(file).map_err(IoError::from)
    }

    fn check_len(&self, len: usize) -> IoResult<()> {
        if len == self.block_size {
            Ok(())
        } else {
            Err(IoError::block_size_mismatch(self.block_size, len))
        }
    }

    fn offset_of(&self, number: u64) -> u64 {
        number * self.block_size as u64
    }
}

impl BlockStore for FileManager {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read_block(&self, block: &BlockId, buf: &mut [u8]) -> IoResult<()> {
        self.check_len(buf.len())?;
        let offset = self.offset_of(block.number());

        self.with_file(block.file_name(), |file| {
            file.seek(SeekFrom::Start(offset))?;
            let mut filled = 0;
            while filled < buf.len() {
                let n = file.read(&mut buf[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            buf[filled..].fill(0);
            Ok(())
        })
    }

    fn write_block(&self, block: &BlockId, buf: &[u8]) -> IoResult<()> {
        self.check_len(buf.len())?;
        let offset = self.offset_of(block.number());

        self.with_file(block.file_name(), |file| {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(buf)?;
            file.sync_data()
        })
    }

    fn append_block(&self, file_name: &str, buf: &[u8]) -> IoResult<BlockId> {
        self.check_len(buf.len())?;
        let block_size = self.block_size as u64;

        let number = self.with_file(file_name, |file| {
            let number = file.metadata()?.len() / block_size;
            file.seek(SeekFrom::Start(number * block_size))?;
            file.write_all(buf)?;
            file.sync_data()?;
            Ok(number)
        })?;

        Ok(BlockId::new(file_name, number))
    }

    fn block_count(&self, file_name: &str) -> IoResult<u64> {
        let block_size = self.block_size as u64;
        self.with_file(file_name, |file| Ok(file.metadata()?.len() / block_size))
    }
}

impl std::fmt::Debug for FileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileManager")
            .field("dir", &self.dir)
            .field("block_size", &self.block_size)
            .field("open_files", &self.files.lock().len())
            .finish()
    }
}
