//! Nullable store: thread-safe in-memory expiring key/value store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use powrace_store::{KvStore, StoreError};
use powrace_types::Timestamp;
use powrace_utils::Clock;

use crate::NullClock;

/// An in-memory [`KvStore`] for testing.
///
/// Counts writes so tests can assert whether the failure flag was touched,
/// and can be switched into a failing mode to exercise error paths.
pub struct NullKvStore {
    entries: Mutex<HashMap<String, (Timestamp, Vec<u8>)>>,
    clock: Arc<dyn Clock>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl NullKvStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(NullClock::default()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            writes: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_failing(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("null store set to fail".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for NullKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for NullKvStore {
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.check_failing()?;
        let now = self.clock.now();
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .is_some_and(|(expiry, _)| !expiry.is_reached(now)))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        self.check_failing()?;
        let expiry = self.clock.now().after(ttl);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (expiry, value.to_vec()));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire_with_clock() {
        let clock = Arc::new(NullClock::new(100));
        let store = NullKvStore::with_clock(clock.clone());
        store.set("work_failure", b"aa", Duration::from_secs(300)).unwrap();
        assert!(store.exists("work_failure").unwrap());
        clock.advance(300);
        assert!(!store.exists("work_failure").unwrap());
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn failing_mode_errors() {
        let store = NullKvStore::new();
        store.set_failing(true);
        assert!(store.exists("k").is_err());
        assert!(store.set("k", b"v", Duration::from_secs(1)).is_err());
        assert_eq!(store.write_count(), 0);
    }
}
