//! The per-call work request.

use serde::{Deserialize, Serialize};

use crate::{BlockHash, Difficulty, NetworkId};

/// A single logical request for proof-of-work.
///
/// Built once per call and shared by every candidate racing to answer it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRequest {
    pub hash: BlockHash,
    pub difficulty: Difficulty,
}

impl WorkRequest {
    pub fn new(hash: BlockHash, difficulty: Difficulty) -> Self {
        Self { hash, difficulty }
    }

    /// Build a request, falling back to the network's base difficulty.
    pub fn for_network(hash: BlockHash, difficulty: Option<Difficulty>, network: NetworkId) -> Self {
        Self {
            hash,
            difficulty: difficulty.unwrap_or_else(|| network.base_difficulty()),
        }
    }
}
