//! Nullable store: thread-safe in-memory history storage for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use txsync_store::{HistoryStore, HistoryStoreFactory, StoreError, StoredHistory};
use txsync_types::NetworkId;

#[derive(Default)]
struct Shared {
    /// Persisted values as the real backend would hold them (JSON text).
    raw: HashMap<NetworkId, String>,
    /// Every successful write, in order.
    writes: Vec<(NetworkId, StoredHistory)>,
    fail_reads: bool,
    fail_writes: bool,
}

/// An in-memory store factory with the same contract as the LMDB one.
///
/// Values go through the same JSON codec, so read-repair behaves identically.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Clone, Default)]
pub struct NullHistoryStoreFactory {
    shared: Arc<Mutex<Shared>>,
}

impl NullHistoryStoreFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap()
    }

    /// Seed a network with a raw persisted value, bypassing the codec.
    pub fn put_raw(&self, network: NetworkId, raw: impl Into<String>) {
        self.lock().raw.insert(network, raw.into());
    }

    /// Seed a network with a stored history.
    pub fn put(&self, network: NetworkId, history: &StoredHistory) {
        let raw = history.encode().unwrap();
        self.put_raw(network, raw);
    }

    /// Decode what is currently persisted for a network.
    pub fn stored(&self, network: NetworkId) -> StoredHistory {
        StoredHistory::decode(self.lock().raw.get(&network).map(String::as_str)).unwrap()
    }

    /// Every history written for a network, oldest first.
    pub fn writes(&self, network: NetworkId) -> Vec<StoredHistory> {
        self.lock()
            .writes
            .iter()
            .filter(|(n, _)| *n == network)
            .map(|(_, h)| h.clone())
            .collect()
    }

    /// Make subsequent reads fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make subsequent writes fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }
}

#[async_trait]
impl HistoryStoreFactory for NullHistoryStoreFactory {
    fn get_store(&self, network: NetworkId) -> Arc<dyn HistoryStore> {
        Arc::new(NullHistoryStore {
            network,
            shared: Arc::clone(&self.shared),
        })
    }

    async fn clean(&self) -> Result<(), StoreError> {
        self.lock().raw.clear();
        Ok(())
    }
}

/// One network's view of a [`NullHistoryStoreFactory`].
pub struct NullHistoryStore {
    network: NetworkId,
    shared: Arc<Mutex<Shared>>,
}

#[async_trait]
impl HistoryStore for NullHistoryStore {
    async fn get_stored_history(&self) -> Result<StoredHistory, StoreError> {
        let shared = self.shared.lock().unwrap();
        if shared.fail_reads {
            return Err(StoreError::Backend("null store read failure".into()));
        }
        StoredHistory::decode(shared.raw.get(&self.network).map(String::as_str))
    }

    async fn store_history(&self, history: &StoredHistory) -> Result<(), StoreError> {
        let mut shared = self.shared.lock().unwrap();
        if shared.fail_writes {
            return Err(StoreError::Backend("null store write failure".into()));
        }
        shared.raw.insert(self.network, history.encode()?);
        shared.writes.push((self.network, history.clone()));
        Ok(())
    }
}
