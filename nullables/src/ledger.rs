//! Nullable ledger: a scripted node answering transaction fetches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use txsync_history::{HistoryError, TransactionFetcher};
use txsync_types::{AccountAddress, BlockNumber, NetworkId, Transaction, TxHash};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<AccountAddress, Vec<Transaction>>,
    tip: Option<BlockNumber>,
    fetches: Vec<(BlockNumber, BlockNumber)>,
    failures_remaining: u32,
}

/// A test ledger holding a fixed set of transactions per account.
///
/// Mined transactions are reported by fetches whose range contains their
/// block; unmined ones only by fetches reaching the current tip. Every fetch
/// is recorded, and failures can be injected.
#[derive(Default)]
pub struct NullLedger {
    state: Mutex<LedgerState>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch, to observe concurrency.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Insert or replace (by hash) a transaction of `account`.
    pub fn upsert(&self, account: &AccountAddress, tx: Transaction) {
        let mut state = self.state.lock().unwrap();
        let txs = state.accounts.entry(account.clone()).or_default();
        txs.retain(|known| known.hash != tx.hash);
        txs.push(tx);
    }

    /// Forget a transaction, as if the node dropped it.
    pub fn remove(&self, account: &AccountAddress, hash: &TxHash) {
        let mut state = self.state.lock().unwrap();
        if let Some(txs) = state.accounts.get_mut(account) {
            txs.retain(|known| &known.hash != hash);
        }
    }

    pub fn set_tip(&self, tip: BlockNumber) {
        self.state.lock().unwrap().tip = Some(tip);
    }

    /// Fail the next `count` fetches.
    pub fn fail_next(&self, count: u32) {
        self.state.lock().unwrap().failures_remaining = count;
    }

    /// Every fetched `(from, to)` range, in call order, including failed ones.
    pub fn fetches(&self) -> Vec<(BlockNumber, BlockNumber)> {
        self.state.lock().unwrap().fetches.clone()
    }

    /// Highest number of fetches that were in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn answer(
        &self,
        account: &AccountAddress,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<Transaction>, HistoryError> {
        let mut state = self.state.lock().unwrap();
        state.fetches.push((from, to));
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(HistoryError::Node("null ledger: injected failure".into()));
        }
        let reaches_tip = state.tip.map_or(true, |tip| to >= tip);
        Ok(state
            .accounts
            .get(account)
            .map(|txs| {
                txs.iter()
                    .filter(|tx| match tx.block_number {
                        Some(block) => from <= block && block <= to,
                        None => reaches_tip,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl TransactionFetcher for NullLedger {
    async fn fetch_transactions(
        &self,
        _network: NetworkId,
        account: &AccountAddress,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<Transaction>, HistoryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.answer(account, from, to)
    }
}
