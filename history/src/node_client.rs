//! HTTP client for reading chain data from a node via JSON-RPC.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use txsync_types::{AccountAddress, BlockNumber, NetworkId, Transaction};

use crate::{HistoryError, TransactionFetcher};

/// Wraps `reqwest::Client` with the node's base URL and provides typed
/// methods for each RPC action the synchronization needs.
///
/// Requests carry an `action` field next to their parameters, and the node
/// answers with either a `result` or an `error`.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    node_url: String,
}

#[derive(Debug, Deserialize)]
struct ChainTipResult {
    block_number: BlockNumber,
}

#[derive(Debug, Deserialize)]
struct AccountTransactionsResult {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

impl NodeClient {
    /// Create a new NodeClient targeting the given base URL (e.g. `http://127.0.0.1:8546`).
    pub fn new(node_url: impl Into<String>) -> Result<Self, HistoryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HistoryError::Node(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            node_url: node_url.into(),
        })
    }

    /// The configured node URL.
    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, HistoryError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| HistoryError::Node("params must be a JSON object".into()))?
            .insert("action".to_string(), serde_json::json!(action));

        let response = self
            .http
            .post(&self.node_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| HistoryError::Node(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(HistoryError::Node(format!(
                "node returned HTTP {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HistoryError::Node(format!("invalid JSON response: {e}")))?;

        extract_result(json)
    }

    /// Current head of the chain on `network`.
    pub async fn chain_tip(&self, network: NetworkId) -> Result<BlockNumber, HistoryError> {
        let result = self
            .rpc_call("chain_tip", serde_json::json!({ "network": network }))
            .await?;

        let resp: ChainTipResult = serde_json::from_value(result)
            .map_err(|e| HistoryError::Node(format!("invalid chain_tip response: {e}")))?;
        Ok(resp.block_number)
    }

    /// Transactions touching `account` in `from..=to`.
    pub async fn account_transactions(
        &self,
        network: NetworkId,
        account: &AccountAddress,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<Transaction>, HistoryError> {
        let result = self
            .rpc_call(
                "account_transactions",
                serde_json::json!({
                    "network": network,
                    "account": account,
                    "from_block": from,
                    "to_block": to,
                }),
            )
            .await?;

        let resp: AccountTransactionsResult = serde_json::from_value(result).map_err(|e| {
            HistoryError::Node(format!("invalid account_transactions response: {e}"))
        })?;
        Ok(resp.transactions)
    }
}

fn extract_result(json: serde_json::Value) -> Result<serde_json::Value, HistoryError> {
    if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
        return Err(HistoryError::Node(format!("node error: {err}")));
    }
    Ok(json.get("result").cloned().unwrap_or(json))
}

#[async_trait]
impl TransactionFetcher for NodeClient {
    async fn fetch_transactions(
        &self,
        network: NetworkId,
        account: &AccountAddress,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<Transaction>, HistoryError> {
        self.account_transactions(network, account, from, to).await
    }
}
