//! Synchronization settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{HistoryError, RetryPolicy};

/// Tunables for [`crate::TransactionHistoryService`].
///
/// Every field has a default, so an empty TOML table is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Blocks re-fetched below the chain tip on every tip change.
    #[serde(default = "default_watch_window_size")]
    pub watch_window_size: u64,

    /// Blocks fetched per step of the sequential catch-up scan.
    #[serde(default = "default_scan_window_size")]
    pub scan_window_size: u64,

    /// Concurrent single-block fetches while rehydrating stored history.
    #[serde(default = "default_rehydrate_concurrency")]
    pub rehydrate_concurrency: usize,

    /// Delay between attempts of a failed fetch.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Attempts per fetch before the pipeline gives up. Unset retries forever.
    #[serde(default)]
    pub max_fetch_attempts: Option<u32>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_watch_window_size() -> u64 {
    100
}

fn default_scan_window_size() -> u64 {
    2_000
}

fn default_rehydrate_concurrency() -> usize {
    5
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            watch_window_size: default_watch_window_size(),
            scan_window_size: default_scan_window_size(),
            rehydrate_concurrency: default_rehydrate_concurrency(),
            retry_delay_ms: default_retry_delay_ms(),
            max_fetch_attempts: None,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.watch_window_size == 0 {
            return Err(HistoryError::Config("watch_window_size must be positive".into()));
        }
        if self.scan_window_size == 0 {
            return Err(HistoryError::Config("scan_window_size must be positive".into()));
        }
        if self.rehydrate_concurrency == 0 {
            return Err(HistoryError::Config(
                "rehydrate_concurrency must be positive".into(),
            ));
        }
        if self.max_fetch_attempts == Some(0) {
            return Err(HistoryError::Config(
                "max_fetch_attempts must be positive when set".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(self.retry_delay_ms),
            max_attempts: self.max_fetch_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: SyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.rehydrate_concurrency, 5);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        let config = SyncConfig {
            scan_window_size: 0,
            ..SyncConfig::default()
        };
        assert!(matches!(config.validate(), Err(HistoryError::Config(_))));

        let config = SyncConfig {
            max_fetch_attempts: Some(0),
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(SyncConfig::default().validate().is_ok());
    }
}
