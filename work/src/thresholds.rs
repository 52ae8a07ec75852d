//! Per-network, block-kind-aware PoW difficulty thresholds.
//!
//! Nano splits difficulty by block kind: send/change blocks carry the base
//! threshold, receive/open blocks a lower one. Banano uses one threshold for
//! everything.

use powrace_types::{Difficulty, NetworkId};

/// Simplified block kind for PoW threshold selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkBlockKind {
    /// Send or change.
    Base,
    /// Receive or open.
    Receive,
}

/// Per-block-kind PoW thresholds for one network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkThresholds {
    pub base: Difficulty,
    pub receive: Difficulty,
}

impl WorkThresholds {
    pub fn for_network(network: NetworkId) -> Self {
        let base = network.base_difficulty();
        let receive = match network {
            NetworkId::Nano => Difficulty(0xfffffe00_00000000),
            NetworkId::Banano | NetworkId::Dev => base,
        };
        Self { base, receive }
    }

    /// Get the required work difficulty for a specific block kind.
    pub fn threshold_for(&self, kind: WorkBlockKind) -> Difficulty {
        match kind {
            WorkBlockKind::Base => self.base,
            WorkBlockKind::Receive => self.receive,
        }
    }

    /// Scale difficulty: higher threshold = harder work.
    ///
    /// The "difficulty inverse" is `u64::MAX - threshold`. Dividing that by the
    /// multiplier shrinks the gap, raising the threshold. A zero base stays zero.
    pub fn multiply(base: Difficulty, multiplier: f64) -> Difficulty {
        if base.0 == 0 || multiplier <= 0.0 {
            return base;
        }
        let difficulty_inv = u64::MAX - base.0;
        let scaled_inv = (difficulty_inv as f64 / multiplier) as u64;
        Difficulty(u64::MAX - scaled_inv)
    }

    /// How many times harder `difficulty` is than `base`.
    pub fn multiplier_of(difficulty: Difficulty, base: Difficulty) -> f64 {
        let base_inv = (u64::MAX - base.0) as f64;
        let inv = (u64::MAX - difficulty.0).max(1) as f64;
        base_inv / inv
    }
}

impl Default for WorkThresholds {
    fn default() -> Self {
        Self::for_network(NetworkId::Nano)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nano_receive_easier_than_send() {
        let thresholds = WorkThresholds::for_network(NetworkId::Nano);
        let send = thresholds.threshold_for(WorkBlockKind::Base);
        let receive = thresholds.threshold_for(WorkBlockKind::Receive);
        assert!(receive < send);
    }

    #[test]
    fn banano_uses_one_threshold() {
        let thresholds = WorkThresholds::for_network(NetworkId::Banano);
        assert_eq!(thresholds.base, thresholds.receive);
    }

    #[test]
    fn nano_send_is_sixty_four_times_receive() {
        let thresholds = WorkThresholds::for_network(NetworkId::Nano);
        let m = WorkThresholds::multiplier_of(thresholds.base, thresholds.receive);
        assert!((m - 64.0).abs() < 0.01, "got {m}");
    }

    #[test]
    fn multiply_roundtrips_multiplier() {
        let base = Difficulty(0xfffffe00_00000000);
        let harder = WorkThresholds::multiply(base, 8.0);
        assert!(harder > base);
        let m = WorkThresholds::multiplier_of(harder, base);
        assert!((m - 8.0).abs() < 0.01);
    }

    #[test]
    fn zero_base_stays_zero() {
        assert_eq!(WorkThresholds::multiply(Difficulty(0), 4.0), Difficulty(0));
    }
}
