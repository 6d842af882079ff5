//! Token amounts.
//!
//! Amounts are represented as integers in the smallest unit (wei) to avoid
//! floating-point errors. One ether is 10^18 wei.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// An amount in wei.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);
    pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

    pub fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    pub fn from_ether(ether: u64) -> Self {
        Self(u128::from(ether) * Self::WEI_PER_ETHER)
    }

    pub fn wei(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}
