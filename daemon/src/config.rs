//! Daemon configuration with TOML file support.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use txsync_history::SyncConfig;
use txsync_types::NetworkId;
use txsync_utils::LogFormat;

/// Configuration for the `txsync` daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; command-line
/// flags and `TXSYNC_*` environment variables override individual fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Which network to synchronize.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// JSON-RPC endpoint of the node.
    #[serde(default = "default_node_url")]
    pub node_url: String,

    /// How often the chain tip is polled from the node.
    #[serde(default = "default_tip_poll_interval_ms")]
    pub tip_poll_interval_ms: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub sync: SyncConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Dev
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./txsync_data")
}

fn default_node_url() -> String {
    "http://127.0.0.1:8546".to_string()
}

fn default_tip_poll_interval_ms() -> u64 {
    4_000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tip_poll_interval_ms == 0 {
            anyhow::bail!("tip_poll_interval_ms must be positive");
        }
        self.sync.validate()?;
        Ok(())
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            node_url: default_node_url(),
            tip_poll_interval_ms: default_tip_poll_interval_ms(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            sync: SyncConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.network, NetworkId::Dev);
        assert_eq!(config.tip_poll_interval_ms, 4_000);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.sync, SyncConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            network = "testnet"
            node_url = "http://node:8546"

            [sync]
            scan_window_size = 500
            max_fetch_attempts = 3
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.network, NetworkId::Testnet);
        assert_eq!(config.node_url, "http://node:8546");
        assert_eq!(config.sync.scan_window_size, 500);
        assert_eq!(config.sync.max_fetch_attempts, Some(3));
        assert_eq!(config.sync.watch_window_size, 100); // default
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let parsed = DaemonConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(parsed.node_url, config.node_url);
        assert_eq!(parsed.sync, config.sync);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(DaemonConfig::from_toml_str("tip_poll_interval_ms = 0").is_err());
        assert!(DaemonConfig::from_toml_str("[sync]\nwatch_window_size = 0").is_err());
        assert!(DaemonConfig::from_toml_str("network = \"moon\"").is_err());
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("txsync.toml");
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();
        let config = DaemonConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(DaemonConfig::from_toml_file(&dir.path().join("missing.toml")).is_err());
    }
}
