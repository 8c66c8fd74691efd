//! Buffer pool errors.

use thiserror::Error;

use crate::file::IoError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum BufferError {
    /// No frame became available before the pin deadline.
    ///
    /// The pool is unchanged; the caller should abort its transaction and
    /// may retry later.
    #[error("no buffer frame available for {request} after waiting {waited_ms} ms")]
    PinTimeout { request: String, waited_ms: u64 },

    /// Frame is not pinned (cannot unpin).
    #[error("frame {frame_id} is not pinned")]
    NotPinned { frame_id: usize },

    /// Frame handle does not belong to this pool.
    #[error("frame {frame_id} does not belong to this buffer pool")]
    ForeignFrame { frame_id: usize },

    /// Pool bookkeeping contradicts itself.
    #[error("buffer pool state is inconsistent: {reason}")]
    InconsistentState { reason: String },

    /// Block storage or log failure.
    #[error("block I/O failed: {0}")]
    Io(#[from] IoError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an inconsistent-state error.
    pub fn inconsistent(reason: impl Into<String>) -> Self {
        Self::InconsistentState {
            reason: reason.into(),
        }
    }

    /// Returns true if this is a transient error that can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PinTimeout { .. })
    }

    /// Returns true if this error indicates a programming error or
    /// corrupted pool state.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotPinned { .. } | Self::ForeignFrame { .. } | Self::InconsistentState { .. }
        )
    }
}
