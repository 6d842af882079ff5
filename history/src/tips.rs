//! Push source of the current chain head, per network.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::watch;
use txsync_types::{BlockNumber, NetworkId};

/// Latest known chain tip for each network.
///
/// Whoever follows the chain publishes here; the synchronization service
/// only subscribes and never polls the node itself. `None` means no tip has
/// been seen yet.
#[derive(Default)]
pub struct ChainTips {
    senders: Mutex<HashMap<NetworkId, watch::Sender<Option<BlockNumber>>>>,
}

impl ChainTips {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new tip. Subscribers only wake if the value changed.
    pub fn publish(&self, network: NetworkId, tip: BlockNumber) {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        let sender = senders
            .entry(network)
            .or_insert_with(|| watch::channel(None).0);
        sender.send_if_modified(|current| {
            if *current == Some(tip) {
                false
            } else {
                *current = Some(tip);
                true
            }
        });
    }

    pub fn subscribe(&self, network: NetworkId) -> watch::Receiver<Option<BlockNumber>> {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders
            .entry(network)
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }

    pub fn current(&self, network: NetworkId) -> Option<BlockNumber> {
        let senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.get(&network).and_then(|sender| *sender.borrow())
    }
}
