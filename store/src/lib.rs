//! Abstract key/value storage and the shared failure flag.
//!
//! Every backend (LMDB shared between processes, in-memory for testing)
//! implements [`KvStore`]. The rest of the workspace depends only on the trait.

pub mod error;
pub mod failure_flag;
pub mod kv;

pub use error::StoreError;
pub use failure_flag::{FailureFlag, DEFAULT_FAILURE_KEY, DEFAULT_FAILURE_TTL};
pub use kv::KvStore;
