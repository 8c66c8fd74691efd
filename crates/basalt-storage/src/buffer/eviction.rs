//! Most-recently-modified replacement policy.
//!
//! When every frame has been constructed and a block that is not resident
//! must be loaded, the pool asks the replacer for an unpinned frame to
//! reuse. The policy is the inverse of LRU on modifications:
//!
//! 1. Among unpinned frames, pick the one with the largest LSN.
//! 2. An unset LSN ranks below every real LSN. If no unpinned frame has a
//!    real LSN, any unpinned frame will do.
//! 3. If every frame is pinned there is no victim.
//!
//! Pools are small, so the replacer scans the whole frame array on every
//! call instead of keeping an ordered index in step with pin/unpin churn.
//! The scan runs under the pool lock and sees a consistent set of pin
//! counts.

use std::sync::Arc;

use basalt_common::types::Lsn;

use super::frame::{BufferFrame, FrameId};

/// Replacement policy that evicts the most recently logged frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct LsnReplacer;

impl LsnReplacer {
    /// Creates a new replacer.
    pub fn new() -> Self {
        Self
    }

    /// Finds a frame to evict.
    ///
    /// Returns `None` if every frame is pinned. Among frames with equal
    /// real LSNs the first in array order wins; among frames without an
    /// LSN the last in array order wins. Callers must not rely on either
    /// tie-break.
    pub fn find_victim(&self, frames: &[Arc<BufferFrame>]) -> Option<FrameId> {
        let mut newest: Option<(Lsn, FrameId)> = None;
        let mut unlogged = None;

        for frame in frames.iter().filter(|frame| !frame.is_pinned()) {
            let lsn = frame.lsn();
            if !lsn.is_valid() {
                unlogged = Some(frame.frame_id());
                continue;
            }
            if newest.map_or(true, |(max, _)| lsn > max) {
                newest = Some((lsn, frame.frame_id()));
            }
        }

        newest.map(|(_, frame_id)| frame_id).or(unlogged)
    }
}
