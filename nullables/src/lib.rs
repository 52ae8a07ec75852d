//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the work coordinator (clock, shared key/value
//! store, local proof-of-work) are abstracted behind traits. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or burn CPU on real work
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod store;
pub mod worker;

pub use clock::NullClock;
pub use store::NullKvStore;
pub use worker::NullLocalWorker;
