//! Process-wide "remote work is failing" flag.
//!
//! Set when a whole race fails to produce work from any remote source. While
//! set, the coordinator hedges every race with local computation. The flag
//! lives in a shared [`KvStore`] so every coordinator instance sees the same
//! decision, and it expires on its own.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::KvStore;

pub const DEFAULT_FAILURE_KEY: &str = "work_failure";
pub const DEFAULT_FAILURE_TTL: Duration = Duration::from_secs(300);

const FLAG_VALUE: &[u8] = b"aa";

/// Time-expiring boolean backed by a shared key/value store.
#[derive(Clone)]
pub struct FailureFlag {
    store: Arc<dyn KvStore>,
    key: String,
    ttl: Duration,
}

impl FailureFlag {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_key(store, DEFAULT_FAILURE_KEY, DEFAULT_FAILURE_TTL)
    }

    pub fn with_key(store: Arc<dyn KvStore>, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            ttl,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the flag is currently set. A store error reads as unset.
    pub fn is_set(&self) -> bool {
        match self.store.exists(&self.key) {
            Ok(set) => set,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read work failure flag");
                false
            }
        }
    }

    /// Set (or refresh) the flag for the configured TTL. Errors are logged only.
    pub fn set(&self) {
        match self.store.set(&self.key, FLAG_VALUE, self.ttl) {
            Ok(()) => debug!(key = %self.key, ttl_secs = self.ttl.as_secs(), "work failure flag set"),
            Err(e) => warn!(key = %self.key, error = %e, "failed to set work failure flag"),
        }
    }
}

impl std::fmt::Debug for FailureFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureFlag")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish()
    }
}
