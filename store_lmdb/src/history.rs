//! LMDB implementation of HistoryStore and HistoryStoreFactory.

use std::sync::Arc;

use async_trait::async_trait;
use txsync_store::{HistoryStore, HistoryStoreFactory, StoreError, StoredHistory};
use txsync_types::NetworkId;

use crate::{LmdbEnvironment, LmdbError};

pub struct LmdbHistoryStore {
    environment: LmdbEnvironment,
    network: NetworkId,
}

impl LmdbHistoryStore {
    pub fn new(environment: LmdbEnvironment, network: NetworkId) -> Self {
        Self {
            environment,
            network,
        }
    }
}

#[async_trait]
impl HistoryStore for LmdbHistoryStore {
    async fn get_stored_history(&self) -> Result<StoredHistory, StoreError> {
        let env = &self.environment.env;
        let rtxn = env.read_txn().map_err(LmdbError::from)?;
        let raw = self
            .environment
            .stored_history_db
            .get(&rtxn, self.network.as_str())
            .map_err(LmdbError::from)?;
        StoredHistory::decode(raw)
    }

    async fn store_history(&self, history: &StoredHistory) -> Result<(), StoreError> {
        let encoded = history.encode()?;
        let env = &self.environment.env;
        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        self.environment
            .stored_history_db
            .put(&mut wtxn, self.network.as_str(), &encoded)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

pub struct LmdbHistoryStoreFactory {
    environment: LmdbEnvironment,
}

impl LmdbHistoryStoreFactory {
    pub fn new(environment: LmdbEnvironment) -> Self {
        Self { environment }
    }
}

#[async_trait]
impl HistoryStoreFactory for LmdbHistoryStoreFactory {
    fn get_store(&self, network: NetworkId) -> Arc<dyn HistoryStore> {
        Arc::new(LmdbHistoryStore::new(self.environment.clone(), network))
    }

    async fn clean(&self) -> Result<(), StoreError> {
        let env = &self.environment.env;
        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        self.environment
            .stored_history_db
            .clear(&mut wtxn)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::info!("cleared stored history for all networks");
        Ok(())
    }
}
