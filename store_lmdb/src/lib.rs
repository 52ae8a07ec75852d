//! LMDB storage backend.
//!
//! Implements [`powrace_store::KvStore`] on top of the `heed` LMDB bindings.
//! LMDB environments can be opened by several processes at once, which is
//! what lets every coordinator on a host share one failure flag.

pub mod environment;
pub mod error;
pub mod kv;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use kv::LmdbKvStore;
