//! Network identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Difficulty, TypesError};

/// Identifies which network work is being generated for.
///
/// The network fixes the default (base) difficulty a work request carries
/// when the caller does not ask for one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// Nano main network.
    Nano,
    /// Banano main network.
    Banano,
    /// Local development network with a trivially low threshold.
    Dev,
}

impl NetworkId {
    /// Base (send/change) difficulty for this network.
    pub fn base_difficulty(&self) -> Difficulty {
        match self {
            Self::Nano => Difficulty(0xfffffff8_00000000),
            Self::Banano => Difficulty(0xfffffe00_00000000),
            Self::Dev => Difficulty(0xff000000_00000000),
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nano => "nano",
            Self::Banano => "banano",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nano" | "live" => Ok(Self::Nano),
            "banano" => Ok(Self::Banano),
            "dev" => Ok(Self::Dev),
            other => Err(TypesError::UnknownNetwork(other.to_string())),
        }
    }
}
