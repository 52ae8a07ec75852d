//! Expiring key/value storage trait.

use std::time::Duration;

use crate::StoreError;

/// A key/value store whose entries expire on their own.
///
/// Entries are never deleted explicitly; an entry past its TTL reads as absent.
/// Implementations must be shareable across tasks.
pub trait KvStore: Send + Sync {
    /// Whether `key` holds a live (unexpired) value.
    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Store `value` under `key`, replacing any previous value, live for `ttl`.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError>;
}
