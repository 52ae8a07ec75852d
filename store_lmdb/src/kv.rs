//! LMDB implementation of KvStore.
//!
//! Each value is stored as `expiry_secs (u64 big-endian) || payload`. An entry
//! whose expiry has been reached reads as absent; `set` simply overwrites it.

use std::sync::Arc;
use std::time::Duration;

use heed::types::{Bytes, Str};
use heed::{Database, Env};
use tracing::debug;

use powrace_store::{KvStore, StoreError};
use powrace_types::Timestamp;
use powrace_utils::Clock;

use crate::LmdbError;

const EXPIRY_LEN: usize = 8;

pub struct LmdbKvStore {
    env: Env,
    kv_db: Database<Str, Bytes>,
    clock: Arc<dyn Clock>,
}

impl LmdbKvStore {
    pub(crate) fn new(env: Env, kv_db: Database<Str, Bytes>, clock: Arc<dyn Clock>) -> Self {
        Self { env, kv_db, clock }
    }

    /// Read a live value.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let Some(raw) = self.kv_db.get(&rtxn, key).map_err(LmdbError::from)? else {
            return Ok(None);
        };
        let (expiry, payload) = split_entry(key, raw)?;
        if expiry.is_reached(self.clock.now()) {
            Ok(None)
        } else {
            Ok(Some(payload.to_vec()))
        }
    }

    /// Delete every entry whose expiry has been reached. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let expired: Vec<String> = {
            let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
            let mut keys = Vec::new();
            for entry in self.kv_db.iter(&rtxn).map_err(LmdbError::from)? {
                let (key, raw) = entry.map_err(LmdbError::from)?;
                let (expiry, _) = split_entry(key, raw)?;
                if expiry.is_reached(now) {
                    keys.push(key.to_string());
                }
            }
            keys
        };

        if expired.is_empty() {
            return Ok(0);
        }
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for key in &expired {
            self.kv_db
                .delete(&mut wtxn, key)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        debug!(count = expired.len(), "purged expired entries");
        Ok(expired.len())
    }
}

impl KvStore for LmdbKvStore {
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        let expiry = self.clock.now().after(ttl);
        let mut entry = Vec::with_capacity(EXPIRY_LEN + value.len());
        entry.extend_from_slice(&expiry.as_secs().to_be_bytes());
        entry.extend_from_slice(value);

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.kv_db
            .put(&mut wtxn, key, &entry)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

fn split_entry<'a>(key: &str, raw: &'a [u8]) -> Result<(Timestamp, &'a [u8]), StoreError> {
    if raw.len() < EXPIRY_LEN {
        return Err(LmdbError::Corrupted(key.to_string()).into());
    }
    let (head, payload) = raw.split_at(EXPIRY_LEN);
    let mut secs = [0u8; EXPIRY_LEN];
    secs.copy_from_slice(head);
    Ok((Timestamp::new(u64::from_be_bytes(secs)), payload))
}
