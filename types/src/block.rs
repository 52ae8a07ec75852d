//! Block hash type for the block-lattice.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 32-byte block hash: the input to every proof-of-work computation.
///
/// Rendered as 64 uppercase hex characters, the way nodes print hashes in RPC
/// responses. Parsing accepts either case.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHash([u8; 32]);

impl Default for BlockHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BlockHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        if s.len() != 64 {
            return Err(TypesError::InvalidHash(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| TypesError::InvalidHash(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Uppercase hex rendering used on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl FromStr for BlockHash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash(")?;
        for b in &self.0[..4] {
            write!(f, "{:02X}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "ABCD000000000000000000000000000000000000000000000000000000000000";

    #[test]
    fn parses_upper_and_lower_case() {
        let upper = BlockHash::from_hex(HASH).unwrap();
        let lower = BlockHash::from_hex(&HASH.to_lowercase()).unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_bytes()[0], 0xAB);
        assert_eq!(upper.as_bytes()[1], 0xCD);
    }

    #[test]
    fn display_is_uppercase_hex() {
        let hash = BlockHash::from_hex(&HASH.to_lowercase()).unwrap();
        assert_eq!(hash.to_string(), HASH);
        assert_eq!(hash.to_hex(), HASH);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            BlockHash::from_hex("ABCD"),
            Err(TypesError::InvalidHash(_))
        ));
    }

    #[test]
    fn rejects_non_hex() {
        let bad = "Z".repeat(64);
        assert!(BlockHash::from_hex(&bad).is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let hash = BlockHash::new([0x11; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "11".repeat(32)));
        let back: BlockHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
