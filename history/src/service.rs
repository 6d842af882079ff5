//! The transaction-history synchronization service.
//!
//! Each watched account gets one pipeline task:
//!
//! 1. Rehydrate: load the stored history and re-fetch every block known to
//!    hold transactions, a bounded number at a time.
//! 2. Steady state, three cooperating loops:
//!    - the watch loop fetches a fixed window ending at the chain tip on
//!      every tip change or refresh request;
//!    - the scan loop walks forward from the checkpoint in large windows
//!      until it reaches the tip window;
//!    - the fold loop is the only writer of the history. It merges each
//!      batch in arrival order, persists the projection, publishes the new
//!      state back to the scan loop and finally to the subscriber.
//!
//! Fetch failures are retried according to the [`RetryPolicy`]. Store
//! failures and exhausted retries end the pipeline; the subscriber sees the
//! stream close.

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use txsync_store::{HistoryStore, HistoryStoreFactory};
use txsync_types::{
    AccountAddress, BatchRange, BlockNumber, NetworkId, RangePurpose, Transaction,
    TransactionBatch,
};

use crate::{
    ChainTips, HistoryError, RetryPolicy, SyncConfig, TransactionFetcher, TransactionHistory,
};

/// Snapshots buffered for a slow subscriber before folding waits.
const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Fetched batches buffered ahead of the fold loop.
const BATCH_CHANNEL_CAPACITY: usize = 8;

pub struct TransactionHistoryService {
    fetcher: Arc<dyn TransactionFetcher>,
    stores: Arc<dyn HistoryStoreFactory>,
    tips: Arc<ChainTips>,
    config: SyncConfig,
    refreshers: Mutex<Vec<mpsc::UnboundedSender<()>>>,
}

impl TransactionHistoryService {
    pub fn new(
        fetcher: Arc<dyn TransactionFetcher>,
        stores: Arc<dyn HistoryStoreFactory>,
        tips: Arc<ChainTips>,
        config: SyncConfig,
    ) -> Result<Self, HistoryError> {
        config.validate()?;
        Ok(Self {
            fetcher,
            stores,
            tips,
            config,
            refreshers: Mutex::new(Vec::new()),
        })
    }

    /// Start synchronizing `account` on `network`.
    ///
    /// The returned watch first yields the rehydrated transactions, then a
    /// fresh snapshot after every fold. Dropping it cancels the pipeline.
    /// Must be called from within a Tokio runtime.
    ///
    /// Each call starts an independent pipeline with its own store reads
    /// and writes.
    pub fn watch_account(&self, network: NetworkId, account: AccountAddress) -> HistoryWatch {
        let (updates_tx, updates_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();

        self.refreshers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(refresh_tx.clone());

        let span = tracing::info_span!("history_watch", network = %network, account = %account);
        let pipeline = Pipeline {
            network,
            account,
            fetcher: Arc::clone(&self.fetcher),
            store: self.stores.get_store(network),
            retry: self.config.retry_policy(),
            config: self.config.clone(),
        };
        let tips = self.tips.subscribe(network);

        let task = tokio::spawn(
            pipeline
                .run(tips, refresh_rx, updates_tx)
                .instrument(span),
        );

        HistoryWatch {
            updates: updates_rx,
            refresh: refresh_tx,
            task,
        }
    }

    /// Ask every live watch to re-fetch its tip window now.
    ///
    /// Requests are not coalesced: each one triggers its own fetch.
    pub fn request_refresh(&self) {
        self.refreshers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|tx| tx.send(()).is_ok());
    }

    /// Reset stored history for every network.
    pub async fn clean(&self) -> Result<(), HistoryError> {
        self.stores.clean().await.map_err(Into::into)
    }
}

/// Live view of one account's transactions.
pub struct HistoryWatch {
    updates: mpsc::Receiver<Vec<Transaction>>,
    refresh: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl HistoryWatch {
    /// The next snapshot, or `None` once the pipeline has stopped.
    pub async fn next(&mut self) -> Option<Vec<Transaction>> {
        self.updates.recv().await
    }

    /// Fetch the tip window again without waiting for a new tip.
    pub fn refresh(&self) {
        let _ = self.refresh.send(());
    }

    /// Stop the pipeline. Equivalent to dropping the watch.
    pub fn cancel(self) {}

    /// Whether the pipeline has stopped, either cancelled or aborted by an error.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for HistoryWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Stream for HistoryWatch {
    type Item = Vec<Transaction>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.updates.poll_recv(cx)
    }
}

/// Next sequential window to scan, if the scan has not caught up yet.
///
/// Nothing is scanned before a tip is known. The window is capped at the tip
/// and stops once its start reaches the tip window, which covers the rest.
fn next_scan_range(
    checkpoint: BlockNumber,
    tip_window: Option<BatchRange>,
    scan_window_size: u64,
) -> Option<BatchRange> {
    let tip_window = tip_window?;
    let range = BatchRange::of_size(checkpoint.saturating_add(1), scan_window_size, RangePurpose::Scan);
    if range.min() >= tip_window.min() {
        return None;
    }
    range.capped_at(tip_window.max())
}

struct Pipeline {
    network: NetworkId,
    account: AccountAddress,
    fetcher: Arc<dyn TransactionFetcher>,
    store: Arc<dyn HistoryStore>,
    retry: RetryPolicy,
    config: SyncConfig,
}

impl Pipeline {
    async fn run(
        self,
        tips: watch::Receiver<Option<BlockNumber>>,
        refresh: mpsc::UnboundedReceiver<()>,
        updates: mpsc::Sender<Vec<Transaction>>,
    ) {
        let initial = match self.rehydrate().await {
            Ok(history) => history,
            Err(err) => {
                tracing::error!(error = %err, "failed to rehydrate transaction history");
                return;
            }
        };

        if updates.send(initial.transactions.clone()).await.is_err() {
            return;
        }

        let (state_tx, state_rx) = watch::channel(initial.clone());
        let (window_tx, window_rx) = watch::channel(None);
        let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);

        let result = tokio::select! {
            r = self.watch_loop(tips, refresh, window_tx, batch_tx.clone()) => r,
            r = self.scan_loop(state_rx, window_rx, batch_tx) => r,
            r = self.fold_loop(initial, batch_rx, state_tx, updates) => r,
        };

        match result {
            Ok(()) => tracing::info!("transaction history watch stopped"),
            Err(err) => tracing::error!(error = %err, "transaction history watch aborted"),
        }
    }

    async fn rehydrate(&self) -> Result<TransactionHistory, HistoryError> {
        let stored = self.store.get_stored_history().await?;
        tracing::info!(
            last_checked_block = stored.last_checked_block,
            known_blocks = stored.blocks_with_known_transactions.len(),
            "rehydrating transaction history"
        );

        let fetched: Vec<TransactionBatch> =
            stream::iter(stored.blocks_with_known_transactions.iter().copied())
                .map(|block| self.fetch(BatchRange::of_size(block, 1, RangePurpose::Scan)))
                .buffer_unordered(self.config.rehydrate_concurrency)
                .try_collect()
                .await?;

        let transactions = fetched
            .into_iter()
            .flat_map(|batch| batch.transactions)
            .collect();
        Ok(TransactionHistory::new(stored.last_checked_block, transactions))
    }

    async fn fetch(&self, range: BatchRange) -> Result<TransactionBatch, HistoryError> {
        let operation = format!("fetch {range}");
        let transactions = self
            .retry
            .run(&operation, || {
                self.fetcher.fetch_transactions(
                    self.network,
                    &self.account,
                    range.min(),
                    range.max(),
                )
            })
            .await?;
        tracing::debug!(range = %range, count = transactions.len(), "fetched batch");
        Ok(TransactionBatch::new(range, transactions))
    }

    async fn watch_loop(
        &self,
        mut tips: watch::Receiver<Option<BlockNumber>>,
        mut refresh: mpsc::UnboundedReceiver<()>,
        tip_window: watch::Sender<Option<BatchRange>>,
        batches: mpsc::Sender<TransactionBatch>,
    ) -> Result<(), HistoryError> {
        let mut tips_open = true;
        let mut refresh_open = true;

        loop {
            let tip = *tips.borrow_and_update();
            if let Some(tip) = tip {
                let range = BatchRange::of_size_from_max(
                    tip,
                    self.config.watch_window_size,
                    RangePurpose::Watch,
                );
                tip_window.send_replace(Some(range));
                let batch = self.fetch(range).await?;
                if batches.send(batch).await.is_err() {
                    return Ok(());
                }
            }

            loop {
                tokio::select! {
                    changed = tips.changed(), if tips_open => match changed {
                        Ok(()) => break,
                        Err(_) => {
                            tracing::warn!("chain tip source closed");
                            tips_open = false;
                        }
                    },
                    signal = refresh.recv(), if refresh_open => match signal {
                        Some(()) => {
                            tracing::debug!("refresh requested");
                            break;
                        }
                        None => refresh_open = false,
                    },
                    else => std::future::pending::<()>().await,
                }
            }
        }
    }

    async fn scan_loop(
        &self,
        mut state: watch::Receiver<TransactionHistory>,
        mut tip_window: watch::Receiver<Option<BatchRange>>,
        batches: mpsc::Sender<TransactionBatch>,
    ) -> Result<(), HistoryError> {
        let mut previous: Option<BatchRange> = None;
        let mut caught_up = false;

        loop {
            let checkpoint = state.borrow_and_update().last_checked_block;
            let window = *tip_window.borrow_and_update();
            let next = next_scan_range(checkpoint, window, self.config.scan_window_size);

            let mut awaiting_fold = false;
            match next {
                Some(range) if previous != Some(range) => {
                    previous = Some(range);
                    caught_up = false;
                    let batch = self.fetch(range).await?;
                    if batches.send(batch).await.is_err() {
                        return Ok(());
                    }
                    awaiting_fold = true;
                }
                Some(_) => {}
                None => {
                    if window.is_some() && !caught_up {
                        tracing::info!(checkpoint, "scan caught up with the chain tip");
                        caught_up = true;
                    }
                }
            }

            // The next range depends on the fold of the batch just sent.
            if awaiting_fold {
                if state.changed().await.is_err() {
                    return Ok(());
                }
                continue;
            }

            tokio::select! {
                changed = state.changed() => if changed.is_err() { return Ok(()) },
                changed = tip_window.changed() => if changed.is_err() { return Ok(()) },
            }
        }
    }

    async fn fold_loop(
        &self,
        initial: TransactionHistory,
        mut batches: mpsc::Receiver<TransactionBatch>,
        state: watch::Sender<TransactionHistory>,
        updates: mpsc::Sender<Vec<Transaction>>,
    ) -> Result<(), HistoryError> {
        let mut history = initial;

        while let Some(batch) = batches.recv().await {
            let previous_checkpoint = history.last_checked_block;
            history = history.merge_batch(&batch);

            self.store.store_history(&history.to_stored()).await?;
            state.send_replace(history.clone());

            tracing::debug!(
                range = %batch.range,
                fetched = batch.transactions.len(),
                known = history.transactions.len(),
                checkpoint = history.last_checked_block,
                "folded batch"
            );
            if history.last_checked_block != previous_checkpoint {
                tracing::info!(checkpoint = history.last_checked_block, "checkpoint advanced");
            }

            if updates.send(history.transactions.clone()).await.is_err() {
                tracing::debug!("subscriber detached");
                return Ok(());
            }
        }

        Ok(())
    }
}
