//! Local proof-of-work.
//!
//! The work function is `blake2b-64(nonce_le || block_hash)` read as a
//! little-endian u64; a nonce is valid when that value is at or above the
//! difficulty threshold. Generation here is the trusted last resort of the
//! work coordinator: it is slow but always produces an answer.

pub mod error;
pub mod generator;
pub mod local;
pub mod thresholds;
pub mod validator;

pub use error::WorkError;
pub use generator::WorkGenerator;
pub use local::{CpuWorker, LocalWorker};
pub use thresholds::{WorkBlockKind, WorkThresholds};
pub use validator::{validate_work, work_value};
