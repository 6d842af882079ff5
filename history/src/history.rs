//! The in-memory transaction history of one account and its reconciliation.

use std::collections::HashMap;

use txsync_store::StoredHistory;
use txsync_types::{sort_canonical, BlockNumber, Transaction, TransactionBatch, TxHash, TxStatus};

/// Everything known about one (network, account) pair.
///
/// `transactions` never holds two entries with the same hash and is kept in
/// canonical order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionHistory {
    /// Highest block up to which the chain has been scanned without gaps.
    pub last_checked_block: BlockNumber,
    pub transactions: Vec<Transaction>,
}

impl TransactionHistory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a history, collapsing duplicate hashes to the last occurrence.
    pub fn new(last_checked_block: BlockNumber, transactions: Vec<Transaction>) -> Self {
        Self {
            last_checked_block,
            transactions: dedup_sorted(transactions),
        }
    }

    /// Fold a freshly fetched batch into this history.
    ///
    /// - Transactions in the batch replace what was known about them.
    /// - Known transactions missing from the batch are kept, except pending
    ///   ones the batch was expected to report, which become failed.
    /// - The checkpoint moves to the end of the batch only when the batch
    ///   follows or contains it; a disjoint tip window leaves it alone.
    pub fn merge_batch(&self, batch: &TransactionBatch) -> Self {
        let fetched: HashMap<&TxHash, &Transaction> = batch
            .transactions
            .iter()
            .map(|tx| (&tx.hash, tx))
            .collect();

        let kept = self
            .transactions
            .iter()
            .filter(|tx| !fetched.contains_key(&tx.hash))
            .map(|tx| {
                if tx.status == TxStatus::Pending && tx.is_expected_in(&batch.range) {
                    tracing::debug!(hash = %tx.hash, range = %batch.range, "pending transaction dropped");
                    tx.clone().with_status(TxStatus::Failed)
                } else {
                    tx.clone()
                }
            });

        let transactions = kept.chain(batch.transactions.iter().cloned()).collect();

        let range = &batch.range;
        let last_checked_block =
            if range.follows(self.last_checked_block) || range.contains(self.last_checked_block) {
                range.max()
            } else {
                self.last_checked_block
            };

        Self::new(last_checked_block, transactions)
    }

    /// The durable projection written after every fold.
    pub fn to_stored(&self) -> StoredHistory {
        StoredHistory::from(self)
    }
}

impl From<&TransactionHistory> for StoredHistory {
    fn from(history: &TransactionHistory) -> Self {
        StoredHistory::from_transactions(history.last_checked_block, &history.transactions)
    }
}

fn dedup_sorted(transactions: Vec<Transaction>) -> Vec<Transaction> {
    let mut by_hash: HashMap<TxHash, Transaction> = HashMap::with_capacity(transactions.len());
    for tx in transactions {
        by_hash.insert(tx.hash.clone(), tx);
    }
    let mut unique: Vec<Transaction> = by_hash.into_values().collect();
    sort_canonical(&mut unique);
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use txsync_types::{AccountAddress, Amount, BatchRange, Direction, RangePurpose, Timestamp};

    const OWN: &str = "0x1111111111111111111111111111111111111111";
    const PEER: &str = "0x2222222222222222222222222222222222222222";

    fn tx(
        hash: &str,
        block: Option<BlockNumber>,
        direction: Direction,
        status: TxStatus,
        value: u64,
        fee: u64,
    ) -> Transaction {
        let (from, to) = match direction {
            Direction::Incoming => (PEER, OWN),
            Direction::Outgoing => (OWN, PEER),
        };
        Transaction {
            hash: TxHash::new(hash),
            from: AccountAddress::parse(from).unwrap(),
            to: AccountAddress::parse(to).ok(),
            block_number: block,
            timestamp: block.map(|b| Timestamp::new(1_600_000_000 + b as u64)),
            value: Amount::from_ether(value),
            gas_price: Amount::from_wei(1_000_000_000),
            gas_used: block.map(|_| 21_000),
            fee: Amount::from_ether(fee),
            gas: 21_000,
            direction,
            status,
            contract_address: None,
        }
    }

    fn base() -> Vec<Transaction> {
        vec![
            tx("0xb1", Some(1), Direction::Incoming, TxStatus::Confirmed, 100, 1),
            tx("0xb2", Some(2), Direction::Incoming, TxStatus::PersistedDepth, 100, 1),
            tx("0xb3", Some(3), Direction::Outgoing, TxStatus::Confirmed, 100, 1),
            tx("0xb4", Some(4), Direction::Outgoing, TxStatus::PersistedCheckpoint, 100, 1),
        ]
    }

    fn pending1() -> Transaction {
        tx("0xp1", None, Direction::Outgoing, TxStatus::Pending, 100, 10)
    }

    fn watch_all() -> BatchRange {
        BatchRange::of_size_from_max(10, 100, RangePurpose::Watch)
    }

    fn sorted(mut txs: Vec<Transaction>) -> Vec<Transaction> {
        sort_canonical(&mut txs);
        txs
    }

    fn merge(previous: Vec<Transaction>, current: Vec<Transaction>) -> Vec<Transaction> {
        TransactionHistory::new(0, previous)
            .merge_batch(&TransactionBatch::new(watch_all(), current))
            .transactions
    }

    #[test]
    fn missing_pending_becomes_failed() {
        let mut previous = base();
        previous.push(pending1());

        let mut expected = vec![pending1().with_status(TxStatus::Failed)];
        expected.extend(base());

        assert_eq!(merge(previous, base()), sorted(expected));
    }

    #[test]
    fn failed_is_never_resurrected() {
        let failed1 = pending1().with_status(TxStatus::Failed);
        let mut previous = base();
        previous.push(failed1.clone());

        let mut expected = vec![failed1];
        expected.extend(base());

        assert_eq!(merge(previous, base()), sorted(expected));
    }

    #[test]
    fn empty_fetch_drops_nothing() {
        assert_eq!(merge(base(), vec![]), sorted(base()));
    }

    #[test]
    fn fresher_status_wins() {
        let confirmed1 = Transaction {
            block_number: Some(5),
            ..pending1().with_status(TxStatus::Confirmed)
        };
        let mut previous = base();
        previous.push(pending1());
        let mut current = vec![confirmed1];
        current.extend(base());

        assert_eq!(merge(previous, current.clone()), sorted(current));
    }

    #[test]
    fn empty_batch_fails_only_pending_inside_range() {
        let inside = tx("0xin", Some(50), Direction::Outgoing, TxStatus::Pending, 1, 1);
        let outside = tx("0xout", Some(500), Direction::Outgoing, TxStatus::Pending, 1, 1);
        let history = TransactionHistory::new(0, vec![inside.clone(), outside.clone()]);

        let range = BatchRange::of_size(1, 100, RangePurpose::Scan);
        let merged = history.merge_batch(&TransactionBatch::empty(range));

        assert_eq!(
            merged.transactions,
            sorted(vec![inside.with_status(TxStatus::Failed), outside])
        );
    }

    #[test]
    fn empty_batch_over_unrelated_range_changes_nothing() {
        let mut txs = base();
        txs.push(pending1());
        let history = TransactionHistory::new(10, txs);

        let range = BatchRange::of_size(500, 100, RangePurpose::Scan);
        let merged = history.merge_batch(&TransactionBatch::empty(range));

        assert_eq!(merged, history);
    }

    #[test]
    fn checkpoint_advances_when_batch_follows() {
        let history = TransactionHistory::new(100, vec![]);
        let range = BatchRange::of_size(101, 50, RangePurpose::Scan);
        let merged = history.merge_batch(&TransactionBatch::empty(range));
        assert_eq!(merged.last_checked_block, 150);
    }

    #[test]
    fn checkpoint_advances_when_batch_contains_it() {
        let history = TransactionHistory::new(100, vec![]);
        let range = BatchRange::of_size_from_max(180, 100, RangePurpose::Watch);
        let merged = history.merge_batch(&TransactionBatch::empty(range));
        assert_eq!(merged.last_checked_block, 180);
    }

    #[test]
    fn disjoint_tip_window_keeps_checkpoint() {
        let history = TransactionHistory::new(100, vec![]);
        let range = BatchRange::of_size_from_max(10_000, 100, RangePurpose::Watch);
        let found = tx("0xnew", Some(9_990), Direction::Incoming, TxStatus::Confirmed, 5, 1);
        let merged = history.merge_batch(&TransactionBatch::new(range, vec![found.clone()]));

        assert_eq!(merged.last_checked_block, 100);
        assert_eq!(merged.transactions, vec![found]);
    }

    #[test]
    fn duplicate_hashes_collapse() {
        let first = tx("0xdup", Some(3), Direction::Incoming, TxStatus::Confirmed, 1, 1);
        let second = first.clone().with_status(TxStatus::PersistedDepth);
        let history = TransactionHistory::new(0, vec![first, second.clone()]);
        assert_eq!(history.transactions, vec![second]);
    }

    #[test]
    fn stored_projection_keeps_mined_blocks() {
        let mut txs = base();
        txs.push(pending1());
        txs.push(tx("0xb5", Some(4), Direction::Incoming, TxStatus::Confirmed, 1, 1));
        let stored = TransactionHistory::new(42, txs).to_stored();

        assert_eq!(stored.last_checked_block, 42);
        assert_eq!(stored.blocks_with_known_transactions, vec![1, 2, 3, 4]);
    }
}
