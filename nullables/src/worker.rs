//! Nullable local worker: instant, scripted proof-of-work.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use powrace_types::{BlockHash, Difficulty, WorkNonce};
use powrace_work::{LocalWorker, WorkError};

/// A [`LocalWorker`] that returns a fixed nonce and records every call.
///
/// An optional delay makes the worker lose races against faster candidates;
/// scripted failures make its first calls return an error.
pub struct NullLocalWorker {
    nonce: WorkNonce,
    delay: Duration,
    failures: AtomicUsize,
    calls: AtomicUsize,
    requests: Mutex<Vec<(BlockHash, Difficulty)>>,
}

impl NullLocalWorker {
    pub fn new(nonce: WorkNonce) -> Self {
        Self::with_delay(nonce, Duration::ZERO)
    }

    pub fn with_delay(nonce: WorkNonce, delay: Duration) -> Self {
        Self {
            nonce,
            delay,
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `count` calls with [`WorkError::Pool`].
    pub fn failing_first(self, count: usize) -> Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }

    /// How many times `work_generate` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every `(hash, difficulty)` pair the worker was asked for, in order.
    pub fn requests(&self) -> Vec<(BlockHash, Difficulty)> {
        self.requests.lock().unwrap().clone()
    }
}

impl LocalWorker for NullLocalWorker {
    fn work_generate(
        &self,
        block_hash: &BlockHash,
        difficulty: Difficulty,
    ) -> Result<WorkNonce, WorkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((*block_hash, difficulty));
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let scripted_failure = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(WorkError::Pool("scripted failure".into()));
        }
        Ok(self.nonce)
    }
}
