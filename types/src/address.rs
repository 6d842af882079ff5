//! Account address type with `0x` prefix.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A ledger account address: `0x` followed by 40 hex digits.
///
/// Always normalised to lowercase so that equality is case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    pub const PREFIX: &'static str = "0x";
    const HEX_LEN: usize = 40;

    /// Parse and normalise an address.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let lower = raw.trim().to_lowercase();
        let body = lower
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| TypesError::InvalidAddress(raw.to_string()))?;
        if body.len() != Self::HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(lower))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalises_case() {
        let addr = AccountAddress::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        let err = AccountAddress::parse("abcdef0123456789abcdef0123456789abcdef01").unwrap_err();
        assert!(matches!(err, TypesError::InvalidAddress(_)));
    }

    #[test]
    fn parse_rejects_bad_length_and_digits() {
        assert!(AccountAddress::parse("0x1234").is_err());
        assert!(AccountAddress::parse("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
    }
}
