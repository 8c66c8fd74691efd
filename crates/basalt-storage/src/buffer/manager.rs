//! Buffer manager: the thread-safe front of the buffer pool.
//!
//! All pool state sits behind one mutex. A pin request that finds every
//! frame pinned waits on a condition variable that is broadcast whenever
//! an unpin frees a frame, re-checking after every wake until it gets a
//! frame or its deadline passes. Waiters are not served in FIFO order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use basalt_common::types::{BlockId, TxnId};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use super::config::BufferConfig;
use super::error::{BufferError, BufferResult};
use super::frame::BufferFrame;
use super::pool::PoolCore;
use super::PoolReport;
use crate::file::{BlockStore, LogFlusher, NoopLog, PageFormatter};

/// Thread-safe buffer pool with bounded waiting for frames.
///
/// Frames handed out by [`pin`](Self::pin) and [`pin_new`](Self::pin_new)
/// stay resident until the matching [`unpin`](Self::unpin).
pub struct BufferManager {
    /// Configuration.
    config: BufferConfig,
    /// Pool state, guarded as a whole.
    core: Mutex<PoolCore>,
    /// Signalled when an unpin makes a frame available.
    frame_released: Condvar,
    /// Pin requests that had to wait.
    pin_waits: AtomicU64,
    /// Pin requests that gave up at their deadline.
    pin_timeouts: AtomicU64,
}

impl BufferManager {
    /// Creates a buffer manager over `store` with no write-ahead log.
    pub fn new(config: BufferConfig, store: Arc<dyn BlockStore>) -> BufferResult<Self> {
        Self::with_log(config, store, Arc::new(NoopLog))
    }

    /// Creates a buffer manager that forces `log` before writing dirty
    /// frames.
    pub fn with_log(
        config: BufferConfig,
        store: Arc<dyn BlockStore>,
        log: Arc<dyn LogFlusher>,
    ) -> BufferResult<Self> {
        config.validate().map_err(BufferError::config)?;
        if store.block_size() != config.block_size {
            return Err(BufferError::config(format!(
                "block store uses {}-byte blocks, pool is configured for {}",
                store.block_size(),
                config.block_size
            )));
        }

        debug!(
            frames = config.num_frames,
            block_size = config.block_size,
            max_wait_ms = config.max_wait.as_millis() as u64,
            "created buffer manager"
        );
        Ok(Self {
            core: Mutex::new(PoolCore::new(config.num_frames, store, log)),
            config,
            frame_released: Condvar::new(),
            pin_waits: AtomicU64::new(0),
            pin_timeouts: AtomicU64::new(0),
        })
    }

    /// Pins a frame to `block`, reading the block in if it is not resident.
    ///
    /// Blocks while every frame is pinned. Fails with
    /// [`BufferError::PinTimeout`] if no frame frees up within the
    /// configured wait; the pool is then unchanged.
    pub fn pin(&self, block: &BlockId) -> BufferResult<Arc<BufferFrame>> {
        self.wait_for_frame(|| block.to_string(), |core| core.pin(block))
    }

    /// Appends a new block to `file_name`, initialized by `formatter`, and
    /// pins a frame to it.
    ///
    /// Same waiting and failure behavior as [`pin`](Self::pin). No block is
    /// appended if the request times out.
    pub fn pin_new(
        &self,
        file_name: &str,
        formatter: &dyn PageFormatter,
    ) -> BufferResult<Arc<BufferFrame>> {
        self.wait_for_frame(
            || format!("a new block of {file_name}"),
            |core| core.pin_new(file_name, formatter),
        )
    }

    /// Releases one pin on `frame`, waking waiters if the frame became
    /// available.
    pub fn unpin(&self, frame: &BufferFrame) -> BufferResult<()> {
        let released = self.core.lock().unpin(frame)?;
        if released {
            self.frame_released.notify_all();
        }
        Ok(())
    }

    /// Writes back every frame last modified by `txn`.
    ///
    /// Returns the number of frames written. The pool lock is only held
    /// while the frames are collected, so a page latch held by another
    /// pinner delays this call alone.
    pub fn flush_all(&self, txn: TxnId) -> BufferResult<usize> {
        let batch = self.core.lock().flush_batch(txn);
        batch.write()
    }

    /// Returns the number of unpinned frames.
    pub fn available(&self) -> usize {
        self.core.lock().available()
    }

    /// Returns the number of frames in the pool.
    pub fn capacity(&self) -> usize {
        self.config.num_frames
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Returns true if `block` is resident.
    pub fn contains(&self, block: &BlockId) -> bool {
        self.core.lock().contains(block)
    }

    /// Returns the frame holding `block` without pinning it.
    ///
    /// The frame may be reassigned as soon as this returns unless the
    /// caller holds a pin on it.
    pub fn frame_for(&self, block: &BlockId) -> Option<Arc<BufferFrame>> {
        self.core.lock().frame_for(block)
    }

    /// Returns per-frame statistics for operators.
    pub fn report(&self) -> PoolReport {
        let mut report = self.core.lock().report();
        report.pin_waits = self.pin_waits.load(Ordering::Relaxed);
        report.pin_timeouts = self.pin_timeouts.load(Ordering::Relaxed);
        report
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Runs `attempt` under the pool lock until it yields a frame or the
    /// configured wait has elapsed since the first attempt.
    fn wait_for_frame<D, F>(&self, describe: D, mut attempt: F) -> BufferResult<Arc<BufferFrame>>
    where
        D: Fn() -> String,
        F: FnMut(&mut PoolCore) -> BufferResult<Option<Arc<BufferFrame>>>,
    {
        let start = Instant::now();
        let deadline = start.checked_add(self.config.max_wait);
        let mut core = self.core.lock();
        let mut waited = false;

        loop {
            if let Some(frame) = attempt(&mut core)? {
                if waited {
                    debug!(
                        request = %describe(),
                        waited_ms = start.elapsed().as_millis() as u64,
                        "pin granted after wait"
                    );
                }
                return Ok(frame);
            }

            if !waited {
                waited = true;
                self.pin_waits.fetch_add(1, Ordering::Relaxed);
            }

            match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    let waited_ms = start.elapsed().as_millis() as u64;
                    self.pin_timeouts.fetch_add(1, Ordering::Relaxed);
                    warn!(request = %describe(), waited_ms, "no buffer frame available, aborting pin");
                    return Err(BufferError::PinTimeout {
                        request: describe(),
                        waited_ms,
                    });
                }
                Some(deadline) => {
                    self.frame_released.wait_until(&mut core, deadline);
                }
                None => self.frame_released.wait(&mut core),
            }
        }
    }
}

impl std::fmt::Debug for BufferManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferManager")
            .field("config", &self.config)
            .field("core", &*self.core.lock())
            .finish()
    }
}
