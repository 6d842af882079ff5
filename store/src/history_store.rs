//! Per-network persistence of stored history.

use std::sync::Arc;

use async_trait::async_trait;
use txsync_types::NetworkId;

use crate::{StoreError, StoredHistory};

/// Durable storage of one network's [`StoredHistory`].
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the stored history, substituting [`StoredHistory::empty`] when
    /// nothing usable has been persisted yet.
    async fn get_stored_history(&self) -> Result<StoredHistory, StoreError>;

    /// Replace the stored history.
    async fn store_history(&self, history: &StoredHistory) -> Result<(), StoreError>;
}

/// Hands out a [`HistoryStore`] per network.
#[async_trait]
pub trait HistoryStoreFactory: Send + Sync {
    fn get_store(&self, network: NetworkId) -> Arc<dyn HistoryStore>;

    /// Reset stored history for every network.
    async fn clean(&self) -> Result<(), StoreError>;
}
