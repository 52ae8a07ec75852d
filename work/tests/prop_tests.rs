use proptest::prelude::*;

use powrace_types::{BlockHash, Difficulty, WorkNonce};
use powrace_work::{validate_work, work_value, WorkGenerator};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Generated PoW always passes its own validation.
    #[test]
    fn generated_pow_always_valid(
        hash_byte in 0u8..=255,
        difficulty in 0u64..0xf000_0000_0000_0000,
    ) {
        let block_hash = BlockHash::new([hash_byte; 32]);
        let difficulty = Difficulty(difficulty);
        let nonce = WorkGenerator.generate(&block_hash, difficulty).unwrap();
        prop_assert!(
            validate_work(&block_hash, nonce, difficulty),
            "generated nonce must pass validation"
        );
    }

    /// Zero difficulty always passes regardless of nonce.
    #[test]
    fn zero_difficulty_always_passes(
        hash_bytes in prop::array::uniform32(0u8..),
        nonce in any::<u64>(),
    ) {
        let block_hash = BlockHash::new(hash_bytes);
        prop_assert!(validate_work(&block_hash, WorkNonce(nonce), Difficulty(0)));
    }

    /// Lower difficulty is easier to meet: if valid at D, then valid at D-1.
    #[test]
    fn lower_difficulty_is_easier(
        hash_bytes in prop::array::uniform32(0u8..),
        nonce in any::<u64>(),
        difficulty in 1u64..u64::MAX,
    ) {
        let block_hash = BlockHash::new(hash_bytes);
        if validate_work(&block_hash, WorkNonce(nonce), Difficulty(difficulty)) {
            prop_assert!(validate_work(&block_hash, WorkNonce(nonce), Difficulty(difficulty - 1)));
        }
    }

    /// A nonce is valid exactly up to its own work value.
    #[test]
    fn work_value_is_the_threshold(
        hash_bytes in prop::array::uniform32(0u8..),
        nonce in any::<u64>(),
    ) {
        let block_hash = BlockHash::new(hash_bytes);
        let value = work_value(&block_hash, nonce);
        prop_assert!(validate_work(&block_hash, WorkNonce(nonce), Difficulty(value)));
        if value < u64::MAX {
            prop_assert!(!validate_work(&block_hash, WorkNonce(nonce), Difficulty(value + 1)));
        }
    }
}
