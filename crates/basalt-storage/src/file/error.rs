//! I/O error types for the file module.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for block I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur during block I/O.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum IoError {
    /// Standard I/O error.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// File not found.
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied.
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// File name that cannot be mapped into the database directory.
    #[error("invalid file name: {name:?}")]
    InvalidFileName { name: String },

    /// Buffer passed to a block operation is not exactly one block long.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BlockSizeMismatch { expected: usize, actual: usize },
}

impl IoError {
    /// Creates a new NotFound error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates an InvalidFileName error.
    pub fn invalid_file_name(name: impl Into<String>) -> Self {
        Self::InvalidFileName { name: name.into() }
    }

    /// Creates a BlockSizeMismatch error.
    pub fn block_size_mismatch(expected: usize, actual: usize) -> Self {
        Self::BlockSizeMismatch { expected, actual }
    }

    /// Converts from std::io::Error with path context.
    pub fn from_io_with_path(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { source: err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_creation() {
        let err = IoError::not_found("/tmp/test.db");
        assert_eq!(err.to_string(), "file not found: /tmp/test.db");

        let err = IoError::invalid_file_name("../escape");
        assert_eq!(err.to_string(), "invalid file name: \"../escape\"");
    }

    #[test]
    fn test_from_io_with_path() {
        let std_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = IoError::from_io_with_path(std_err, "/tmp/x.tbl");
        assert!(matches!(err, IoError::NotFound { .. }));

        let std_err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let err = IoError::from_io_with_path(std_err, "/tmp/x.tbl");
        assert!(matches!(err, IoError::Io { .. }));
    }
}
