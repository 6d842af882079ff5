//! The externally supplied capability to read an account's transactions.

use async_trait::async_trait;
use txsync_types::{AccountAddress, BlockNumber, NetworkId, Transaction};

use crate::HistoryError;

#[async_trait]
pub trait TransactionFetcher: Send + Sync {
    /// Every transaction touching `account` in blocks `from..=to`.
    ///
    /// Fetches whose range reaches the chain tip also report unmined
    /// transactions.
    async fn fetch_transactions(
        &self,
        network: NetworkId,
        account: &AccountAddress,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<Transaction>, HistoryError>;
}
