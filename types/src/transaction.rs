//! The canonical transaction record and its lifecycle.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{AccountAddress, Amount, BatchRange, BlockNumber, RangePurpose, Timestamp, TxHash};

/// Lifecycle status of a transaction as seen by the wallet.
///
/// The declaration order is the ranking used when sorting: pending lowest,
/// then failed, confirmed, persisted by depth, persisted by checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Submitted but not yet mined.
    Pending,
    /// Expected in a fetched window but no longer reported there.
    Failed,
    /// Mined.
    Confirmed,
    /// Buried deep enough to be considered final.
    PersistedDepth,
    /// Covered by a ledger checkpoint.
    PersistedCheckpoint,
}

/// Whether the watched account sent or received the transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// A transaction touching the watched account.
///
/// Identity is `hash`; every other field may change between fetches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: TxHash,
    pub from: AccountAddress,
    pub to: Option<AccountAddress>,
    /// `None` while the transaction is not mined.
    pub block_number: Option<BlockNumber>,
    pub timestamp: Option<Timestamp>,
    pub value: Amount,
    pub gas_price: Amount,
    pub gas_used: Option<u64>,
    pub fee: Amount,
    pub gas: u64,
    pub direction: Direction,
    pub status: TxStatus,
    pub contract_address: Option<AccountAddress>,
}

impl Transaction {
    /// Block number used for ordering; unmined transactions sort last.
    pub fn sort_block(&self) -> BlockNumber {
        self.block_number.unwrap_or(BlockNumber::MAX)
    }

    /// Canonical ordering: block, status rank, direction, hash.
    ///
    /// Direction and hash only make the order total.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.sort_block()
            .cmp(&other.sort_block())
            .then(self.status.cmp(&other.status))
            .then(self.direction.cmp(&other.direction))
            .then_with(|| self.hash.cmp(&other.hash))
    }

    /// Whether a fetch over `range` is expected to report this transaction.
    ///
    /// Mined transactions are expected in ranges containing their block.
    /// Unmined ones can only show up near the tip, i.e. in watch windows.
    pub fn is_expected_in(&self, range: &BatchRange) -> bool {
        match self.block_number {
            Some(block) => range.contains(block),
            None => range.purpose() == RangePurpose::Watch,
        }
    }

    pub fn with_status(self, status: TxStatus) -> Self {
        Self { status, ..self }
    }
}

/// Sort transactions in canonical order.
pub fn sort_canonical(transactions: &mut [Transaction]) {
    transactions.sort_by(Transaction::canonical_cmp);
}

/// The result of fetching one range: every transaction the node reported in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionBatch {
    pub range: BatchRange,
    pub transactions: Vec<Transaction>,
}

impl TransactionBatch {
    pub fn new(range: BatchRange, transactions: Vec<Transaction>) -> Self {
        Self {
            range,
            transactions,
        }
    }

    pub fn empty(range: BatchRange) -> Self {
        Self::new(range, Vec::new())
    }
}
