//! The local-compute seam used by the work coordinator.

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::{WorkError, WorkGenerator};
use powrace_types::{BlockHash, Difficulty, WorkNonce};

/// Something that can produce proof-of-work without leaving the process.
///
/// Implementations block the calling thread until they have an answer; async
/// callers run them on a blocking pool.
pub trait LocalWorker: Send + Sync {
    fn work_generate(
        &self,
        block_hash: &BlockHash,
        difficulty: Difficulty,
    ) -> Result<WorkNonce, WorkError>;
}

/// CPU worker backed by a dedicated rayon pool.
pub struct CpuWorker {
    pool: ThreadPool,
}

impl CpuWorker {
    /// Build a worker with `threads` search threads (0 = one per core).
    pub fn new(threads: usize) -> Result<Self, WorkError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("work-{i}"))
            .build()
            .map_err(|e| WorkError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl LocalWorker for CpuWorker {
    fn work_generate(
        &self,
        block_hash: &BlockHash,
        difficulty: Difficulty,
    ) -> Result<WorkNonce, WorkError> {
        debug!(hash = %block_hash, %difficulty, threads = self.threads(), "local work_generate");
        self.pool
            .install(|| WorkGenerator.generate(block_hash, difficulty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_work;

    #[test]
    fn cpu_worker_produces_valid_work() {
        let worker = CpuWorker::new(2).unwrap();
        assert_eq!(worker.threads(), 2);
        let hash = BlockHash::new([0x33; 32]);
        let difficulty = Difficulty(0xfe00_0000_0000_0000);
        let nonce = worker.work_generate(&hash, difficulty).unwrap();
        assert!(validate_work(&hash, nonce, difficulty));
    }
}
