//! PoW generation (multi-threaded CPU).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rayon::prelude::*;

use crate::validator::work_value;
use crate::WorkError;
use powrace_types::{BlockHash, Difficulty, WorkNonce};

/// Generates proof-of-work for a block using every thread of the current rayon pool.
pub struct WorkGenerator;

/// Nonces tried per thread before checking whether another thread already won.
const BATCH_SIZE: u64 = 4096;

impl WorkGenerator {
    /// Generate a work nonce that meets the minimum difficulty.
    ///
    /// Each thread walks its own residue class of the nonce space. The first
    /// thread to find a valid nonce signals the others to stop.
    pub fn generate(
        &self,
        block_hash: &BlockHash,
        min_difficulty: Difficulty,
    ) -> Result<WorkNonce, WorkError> {
        if min_difficulty.0 == 0 {
            return Ok(WorkNonce(0));
        }

        let found = AtomicU64::new(0);
        let done = AtomicBool::new(false);
        let num_threads = rayon::current_num_threads().max(1) as u64;

        (0..num_threads).into_par_iter().for_each(|thread_id| {
            let mut nonce = thread_id;
            loop {
                if done.load(Ordering::Acquire) {
                    return;
                }
                for _ in 0..BATCH_SIZE {
                    if work_value(block_hash, nonce) >= min_difficulty.0 {
                        if done
                            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok()
                        {
                            found.store(nonce, Ordering::Release);
                        }
                        return;
                    }
                    nonce = match nonce.checked_add(num_threads) {
                        Some(next) => next,
                        None => return,
                    };
                }
            }
        });

        if done.load(Ordering::Acquire) {
            Ok(WorkNonce(found.load(Ordering::Acquire)))
        } else {
            Err(WorkError::Exhausted)
        }
    }
}
