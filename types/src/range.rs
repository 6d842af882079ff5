//! Inclusive block ranges fetched by the synchronization loops.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Height of a block on the ledger. Never negative once stored in a range.
pub type BlockNumber = i64;

/// Why a range is being fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangePurpose {
    /// Sequential catch-up window starting right after the checkpoint.
    Scan,
    /// Fixed-size window ending at the chain tip.
    Watch,
}

impl RangePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Watch => "watch",
        }
    }
}

/// An inclusive block range `[min, max]` tagged with its purpose.
///
/// Every constructor keeps `0 <= min <= max`, whatever it is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchRange {
    min: BlockNumber,
    max: BlockNumber,
    purpose: RangePurpose,
}

impl BatchRange {
    /// A range of `size` blocks starting at `min`.
    ///
    /// A negative `min` is moved up to 0 and the range keeps its size.
    /// A `size` of 0 is treated as 1.
    pub fn of_size(min: BlockNumber, size: u64, purpose: RangePurpose) -> Self {
        let min = min.max(0);
        let max = min.saturating_add(span(size));
        Self { min, max, purpose }
    }

    /// A range of `size` blocks ending at `max`.
    ///
    /// The lower bound is clamped to 0, so ranges near genesis are shorter
    /// than `size`. A negative `max` collapses to `[0, 0]`.
    pub fn of_size_from_max(max: BlockNumber, size: u64, purpose: RangePurpose) -> Self {
        let max = max.max(0);
        let min = max.saturating_sub(span(size)).max(0);
        Self { min, max, purpose }
    }

    pub fn min(&self) -> BlockNumber {
        self.min
    }

    pub fn max(&self) -> BlockNumber {
        self.max
    }

    pub fn purpose(&self) -> RangePurpose {
        self.purpose
    }

    /// Number of blocks covered.
    pub fn len(&self) -> u64 {
        (self.max - self.min) as u64 + 1
    }

    /// Always false: a range covers at least one block.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `block` lies inside the range.
    pub fn contains(&self, block: BlockNumber) -> bool {
        self.min <= block && block <= self.max
    }

    /// Whether the range starts exactly after `block`.
    pub fn follows(&self, block: BlockNumber) -> bool {
        block.checked_add(1) == Some(self.min)
    }

    /// The same range with its upper bound lowered to `ceiling`.
    ///
    /// Returns `None` if the whole range lies above `ceiling`.
    pub fn capped_at(&self, ceiling: BlockNumber) -> Option<Self> {
        if ceiling < self.min {
            return None;
        }
        Some(Self {
            max: self.max.min(ceiling),
            ..*self
        })
    }
}

fn span(size: u64) -> BlockNumber {
    let size = BlockNumber::try_from(size.max(1)).unwrap_or(BlockNumber::MAX);
    size - 1
}

impl fmt::Display for BatchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{}]", self.purpose.as_str(), self.min, self.max)
    }
}
