//! Periodically reads the chain tip from the node and publishes it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use txsync_history::{ChainTips, HistoryError, NodeClient};
use txsync_types::{BlockNumber, NetworkId};

#[async_trait]
pub trait TipSource: Send + Sync {
    async fn chain_tip(&self, network: NetworkId) -> Result<BlockNumber, HistoryError>;
}

#[async_trait]
impl TipSource for NodeClient {
    async fn chain_tip(&self, network: NetworkId) -> Result<BlockNumber, HistoryError> {
        NodeClient::chain_tip(self, network).await
    }
}

/// Poll `source` every `interval` until shutdown, publishing into `tips`.
///
/// Poll failures are logged and skipped; the next tick tries again.
pub async fn run_tip_poller(
    source: Arc<dyn TipSource>,
    tips: Arc<ChainTips>,
    network: NetworkId,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => match source.chain_tip(network).await {
                Ok(tip) => {
                    tracing::trace!(%network, tip, "polled chain tip");
                    tips.publish(network, tip);
                }
                Err(err) => tracing::warn!(%network, error = %err, "failed to poll chain tip"),
            },
            _ = shutdown.recv() => {
                tracing::debug!("tip poller stopped");
                return;
            }
        }
    }
}
