//! Fundamental types for the work-generation workspace.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! block hashes, difficulty thresholds, work nonces, network selection, and the
//! immutable per-call work request.

pub mod block;
pub mod error;
pub mod network;
pub mod request;
pub mod time;
pub mod work;

pub use block::BlockHash;
pub use error::TypesError;
pub use network::NetworkId;
pub use request::WorkRequest;
pub use time::Timestamp;
pub use work::{Difficulty, WorkNonce};
