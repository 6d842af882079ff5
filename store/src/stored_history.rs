//! The compact, durable projection of a transaction history.
//!
//! Only the checkpoint and the block numbers known to hold transactions are
//! kept. Transaction payloads are re-fetched from the node on startup, so a
//! stale or incomplete record is never trusted across restarts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use txsync_types::{BlockNumber, Transaction};

use crate::StoreError;

/// Persisted format, stable across restarts:
/// `{"lastCheckedBlock": int, "blocksWithKnownTransactions": [int]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredHistory {
    pub last_checked_block: BlockNumber,
    pub blocks_with_known_transactions: Vec<BlockNumber>,
}

impl StoredHistory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Project a checkpoint and its transactions.
    ///
    /// Block numbers come out sorted and unique; unmined transactions have no
    /// block to remember and are skipped.
    pub fn from_transactions(last_checked_block: BlockNumber, transactions: &[Transaction]) -> Self {
        let blocks: BTreeSet<BlockNumber> =
            transactions.iter().filter_map(|tx| tx.block_number).collect();
        Self {
            last_checked_block,
            blocks_with_known_transactions: blocks.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_checked_block == 0 && self.blocks_with_known_transactions.is_empty()
    }

    /// Decode a persisted value.
    ///
    /// Absent data, `null` and `{}` all read as [`StoredHistory::empty`].
    /// Anything else that does not match the format is an error, and
    /// negative block numbers are reported as corruption.
    pub fn decode(raw: Option<&str>) -> Result<Self, StoreError> {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(Self::empty());
        };
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let stored: Self = match value {
            serde_json::Value::Null => return Ok(Self::empty()),
            serde_json::Value::Object(ref fields) if fields.is_empty() => return Ok(Self::empty()),
            value => serde_json::from_value(value)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
        };
        if stored.last_checked_block < 0
            || stored.blocks_with_known_transactions.iter().any(|b| *b < 0)
        {
            return Err(StoreError::Corruption(format!(
                "negative block number in stored history: {raw}"
            )));
        }
        Ok(stored)
    }

    pub fn encode(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_repairs_missing_shapes() {
        assert_eq!(StoredHistory::decode(None).unwrap(), StoredHistory::empty());
        assert_eq!(StoredHistory::decode(Some("")).unwrap(), StoredHistory::empty());
        assert_eq!(StoredHistory::decode(Some("null")).unwrap(), StoredHistory::empty());
        assert_eq!(StoredHistory::decode(Some(" {} ")).unwrap(), StoredHistory::empty());
    }

    #[test]
    fn decode_reads_persisted_format() {
        let stored = StoredHistory::decode(Some(
            r#"{"lastCheckedBlock":120,"blocksWithKnownTransactions":[3,77]}"#,
        ))
        .unwrap();
        assert_eq!(stored.last_checked_block, 120);
        assert_eq!(stored.blocks_with_known_transactions, vec![3, 77]);
    }

    #[test]
    fn decode_rejects_malformed_data() {
        assert!(matches!(
            StoredHistory::decode(Some("{\"lastCheckedBlock\":\"x\"}")),
            Err(StoreError::Serialization(_))
        ));
        assert!(StoredHistory::decode(Some("[1,2]")).is_err());
        assert!(StoredHistory::decode(Some("{not json")).is_err());
    }

    #[test]
    fn decode_flags_negative_blocks_as_corruption() {
        assert!(matches!(
            StoredHistory::decode(Some(
                r#"{"lastCheckedBlock":-1,"blocksWithKnownTransactions":[]}"#
            )),
            Err(StoreError::Corruption(_))
        ));
    }

    #[test]
    fn encode_uses_camel_case_keys() {
        let stored = StoredHistory {
            last_checked_block: 9,
            blocks_with_known_transactions: vec![1, 2],
        };
        assert_eq!(
            stored.encode().unwrap(),
            r#"{"lastCheckedBlock":9,"blocksWithKnownTransactions":[1,2]}"#
        );
    }
}
