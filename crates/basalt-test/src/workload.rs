//! Concurrent pin/unpin workloads.
//!
//! Each worker repeatedly pins a random block, optionally dirties it, and
//! unpins it again. Workers never hold more than one pin at a time, so a
//! pool with at least as many frames as workers never times out.

use std::thread;

use basalt_common::types::{BlockId, Lsn, TxnId};
use basalt_storage::buffer::{BufferManager, BufferResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Shape of a pin/unpin workload.
#[derive(Debug, Clone)]
pub struct PinWorkload {
    /// File the blocks belong to.
    pub file_name: String,
    /// Number of distinct blocks touched.
    pub blocks: u64,
    /// Number of worker threads.
    pub workers: usize,
    /// Pin/unpin pairs per worker.
    pub ops_per_worker: usize,
    /// Fraction of pins that modify the frame before unpinning.
    pub write_ratio: f64,
    /// RNG seed; worker `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for PinWorkload {
    fn default() -> Self {
        Self {
            file_name: "workload.tbl".to_string(),
            blocks: 32,
            workers: 4,
            ops_per_worker: 500,
            write_ratio: 0.25,
            seed: 42,
        }
    }
}

/// Totals from a finished workload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkloadOutcome {
    /// Successful pins.
    pub pins: u64,
    /// Pins that modified the frame.
    pub writes: u64,
}

impl PinWorkload {
    /// Runs the workload against `manager` and waits for every worker.
    ///
    /// Returns the first error any worker hit.
    pub fn run(&self, manager: &BufferManager) -> BufferResult<WorkloadOutcome> {
        let results: Vec<BufferResult<WorkloadOutcome>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.workers)
                .map(|worker| scope.spawn(move || self.run_worker(manager, worker)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut total = WorkloadOutcome::default();
        for result in results {
            let outcome = result?;
            total.pins += outcome.pins;
            total.writes += outcome.writes;
        }
        debug!(pins = total.pins, writes = total.writes, "workload finished");
        Ok(total)
    }

    fn run_worker(&self, manager: &BufferManager, worker: usize) -> BufferResult<WorkloadOutcome> {
        let mut rng = StdRng::seed_from_u64(self.seed + worker as u64);
        let txn = TxnId::new(worker as u64 + 1);
        let mut outcome = WorkloadOutcome::default();

        for op in 0..self.ops_per_worker {
            let block = BlockId::new(self.file_name.as_str(), rng.gen_range(0..self.blocks));
            let frame = manager.pin(&block)?;
            outcome.pins += 1;

            if rng.gen_bool(self.write_ratio) {
                frame.write_data()[0] = worker as u8;
                let lsn = Lsn::new((worker * self.ops_per_worker + op) as u64 + 1);
                frame.set_modified(txn, lsn);
                outcome.writes += 1;
            }
            manager.unpin(&frame)?;
        }
        Ok(outcome)
    }
}
