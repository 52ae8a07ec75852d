//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use powrace_utils::{Clock, SystemClock};

use crate::{LmdbError, LmdbKvStore};

/// Default map size: the store only ever holds a handful of small records.
pub const DEFAULT_MAP_SIZE: usize = 16 * 1024 * 1024;

const KV_DB_NAME: &str = "kv";

/// Wraps the LMDB environment and its database handles.
pub struct LmdbEnvironment {
    env: Env,
    kv_db: Database<Str, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment directory is only ever opened through this
        // type, and every process maps it with the same flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(4)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let kv_db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(KV_DB_NAME))?;
        wtxn.commit()?;

        info!(path = %path.display(), "opened LMDB environment");
        Ok(Self {
            env,
            kv_db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key/value store reading wall-clock time.
    pub fn kv_store(&self) -> LmdbKvStore {
        self.kv_store_with_clock(Arc::new(SystemClock))
    }

    /// Key/value store reading time from `clock`.
    pub fn kv_store_with_clock(&self, clock: Arc<dyn Clock>) -> LmdbKvStore {
        LmdbKvStore::new(self.env.clone(), self.kv_db, clock)
    }
}
