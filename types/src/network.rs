//! Network identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Identifies which ledger network an account is watched on.
///
/// Stored history is partitioned by network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
    /// Local development network.
    Dev,
}

impl NetworkId {
    pub const ALL: [NetworkId; 3] = [Self::Mainnet, Self::Testnet, Self::Dev];

    /// Human-readable name, also used as the persistence key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
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
            "mainnet" | "main" | "live" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            "dev" => Ok(Self::Dev),
            _ => Err(TypesError::UnknownNetwork(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("live".parse::<NetworkId>().unwrap(), NetworkId::Mainnet);
        assert_eq!("Testnet".parse::<NetworkId>().unwrap(), NetworkId::Testnet);
        assert!("moon".parse::<NetworkId>().is_err());
    }

    #[test]
    fn display_matches_persistence_key() {
        for network in NetworkId::ALL {
            assert_eq!(network.to_string(), network.as_str());
            assert_eq!(network.as_str().parse::<NetworkId>().unwrap(), network);
        }
    }
}
