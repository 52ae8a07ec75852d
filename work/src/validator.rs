//! PoW validation.

use blake2::digest::consts::U8;
use blake2::{Blake2b, Digest};

use powrace_types::{BlockHash, Difficulty, WorkNonce};

type Blake2b64 = Blake2b<U8>;

/// Compute the work value of `nonce` for `block_hash`.
pub fn work_value(block_hash: &BlockHash, nonce: u64) -> u64 {
    let digest = Blake2b64::new()
        .chain_update(nonce.to_le_bytes())
        .chain_update(block_hash.as_bytes())
        .finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest);
    u64::from_le_bytes(out)
}

/// Validate that a work nonce meets the minimum difficulty for a given block.
pub fn validate_work(block_hash: &BlockHash, nonce: WorkNonce, min_difficulty: Difficulty) -> bool {
    work_value(block_hash, nonce.0) >= min_difficulty.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_difficulty_accepts_anything() {
        let hash = BlockHash::new([0x42; 32]);
        assert!(validate_work(&hash, WorkNonce(12345), Difficulty(0)));
    }

    #[test]
    fn threshold_is_inclusive() {
        let hash = BlockHash::new([0xAA; 32]);
        let value = work_value(&hash, 777);
        assert!(validate_work(&hash, WorkNonce(777), Difficulty(value)));
        if value < u64::MAX {
            assert!(!validate_work(&hash, WorkNonce(777), Difficulty(value + 1)));
        }
    }

    #[test]
    fn value_depends_on_hash() {
        let a = work_value(&BlockHash::new([1; 32]), 5);
        let b = work_value(&BlockHash::new([2; 32]), 5);
        assert_ne!(a, b);
    }
}
