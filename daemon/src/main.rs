//! txsync daemon: keeps one account's transaction history in sync with a node.

mod config;
mod shutdown;
mod tip_poller;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use txsync_history::{ChainTips, NodeClient, TransactionHistoryService};
use txsync_store::{HistoryStoreFactory, StoredHistory};
use txsync_store_lmdb::{environment::DEFAULT_MAP_SIZE, LmdbEnvironment, LmdbHistoryStoreFactory};
use txsync_types::{AccountAddress, NetworkId, Transaction, TxStatus};
use txsync_utils::LogFormat;

use crate::config::DaemonConfig;
use crate::shutdown::ShutdownController;
use crate::tip_poller::run_tip_poller;

#[derive(Parser)]
#[command(name = "txsync", about = "Wallet transaction-history synchronization")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TXSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Network to synchronize: "mainnet", "testnet", or "dev".
    #[arg(long, env = "TXSYNC_NETWORK")]
    network: Option<NetworkId>,

    /// Data directory for the LMDB store.
    #[arg(long, env = "TXSYNC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// JSON-RPC endpoint of the node.
    #[arg(long, env = "TXSYNC_NODE_URL")]
    node_url: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TXSYNC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TXSYNC_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Follow an account and log every history update until interrupted.
    Watch {
        /// Account to synchronize (0x-prefixed hex address).
        #[arg(long, env = "TXSYNC_ACCOUNT")]
        account: AccountAddress,
    },
    /// Print the stored history of the configured network as JSON.
    Show,
    /// Reset stored history for every network.
    Clean,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match self.config {
            Some(ref path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(ref data_dir) = self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(ref node_url) = self.node_url {
            config.node_url = node_url.clone();
        }
        if let Some(ref log_level) = self.log_level {
            config.log_level = log_level.clone();
        }
        if let Some(log_format) = self.log_format {
            config.log_format = log_format;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    txsync_utils::init_logging(config.log_format, &config.log_level);

    if let Some(ref path) = cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Watch { account } => watch(config, account).await?,
        Command::Show => show(&config).await?,
        Command::Clean => clean(&config).await?,
    }

    Ok(())
}

fn open_stores(config: &DaemonConfig) -> anyhow::Result<LmdbHistoryStoreFactory> {
    let env = LmdbEnvironment::open(&config.data_dir, DEFAULT_MAP_SIZE)?;
    Ok(LmdbHistoryStoreFactory::new(env))
}

async fn watch(config: DaemonConfig, account: AccountAddress) -> anyhow::Result<()> {
    let network = config.network;
    tracing::info!(
        %network,
        %account,
        node_url = %config.node_url,
        data_dir = %config.data_dir.display(),
        "starting transaction history sync"
    );

    let stores = Arc::new(open_stores(&config)?);
    let client = Arc::new(NodeClient::new(config.node_url.clone())?);
    let tips = Arc::new(ChainTips::new());
    let shutdown = Arc::new(ShutdownController::new());

    let poller = tokio::spawn(run_tip_poller(
        client.clone(),
        Arc::clone(&tips),
        network,
        Duration::from_millis(config.tip_poll_interval_ms),
        shutdown.subscribe(),
    ));

    let signals = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if let Err(err) = shutdown.wait_for_signal().await {
                tracing::error!(error = %err, "failed to listen for shutdown signals");
            }
        })
    };

    let service = TransactionHistoryService::new(client, stores, tips, config.sync.clone())?;
    let mut history = service.watch_account(network, account);
    let mut stop = shutdown.subscribe();

    let outcome = loop {
        tokio::select! {
            snapshot = history.next() => match snapshot {
                Some(transactions) => log_snapshot(&transactions),
                None => break Err(anyhow::anyhow!("synchronization stopped unexpectedly")),
            },
            _ = stop.recv() => break Ok(()),
        }
    };

    history.cancel();
    shutdown.shutdown();
    signals.abort();
    let _ = poller.await;

    if outcome.is_ok() {
        tracing::info!("txsync exited cleanly");
    }
    outcome
}

fn log_snapshot(transactions: &[Transaction]) {
    let pending = transactions
        .iter()
        .filter(|tx| tx.status == TxStatus::Pending)
        .count();
    let failed = transactions
        .iter()
        .filter(|tx| tx.status == TxStatus::Failed)
        .count();
    let latest_block = transactions.iter().filter_map(|tx| tx.block_number).max();
    tracing::info!(
        total = transactions.len(),
        pending,
        failed,
        latest_block,
        "transaction history updated"
    );
    for tx in transactions {
        tracing::debug!(
            hash = %tx.hash,
            block = tx.block_number,
            status = ?tx.status,
            direction = ?tx.direction,
            value = %tx.value,
            "transaction"
        );
    }
}

async fn show(config: &DaemonConfig) -> anyhow::Result<()> {
    let stores = open_stores(config)?;
    let stored: StoredHistory = stores.get_store(config.network).get_stored_history().await?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}

async fn clean(config: &DaemonConfig) -> anyhow::Result<()> {
    open_stores(config)?.clean().await?;
    tracing::info!(data_dir = %config.data_dir.display(), "stored history reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "txsync",
            "--network",
            "testnet",
            "--log-format",
            "json",
            "watch",
            "--account",
            "0xABCDEFabcdef0123456789012345678901234567",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.network, NetworkId::Testnet);
        assert_eq!(config.log_format, LogFormat::Json);
        match cli.command {
            Command::Watch { account } => {
                assert_eq!(account.as_str(), "0xabcdefabcdef0123456789012345678901234567")
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn invalid_account_is_rejected() {
        assert!(Cli::try_parse_from(["txsync", "watch", "--account", "0x12"]).is_err());
    }

    #[test]
    fn cli_overrides_config_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("txsync.toml");
        std::fs::write(&path, "network = \"mainnet\"\nnode_url = \"http://file:1\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "txsync",
            "--config",
            path.to_str().unwrap(),
            "--node-url",
            "http://flag:2",
            "show",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.network, NetworkId::Mainnet);
        assert_eq!(config.node_url, "http://flag:2");
    }

    #[tokio::test]
    async fn clean_resets_lmdb_history() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = DaemonConfig {
            data_dir: dir.path().to_path_buf(),
            ..DaemonConfig::default()
        };
        let stored = StoredHistory {
            last_checked_block: 12,
            blocks_with_known_transactions: vec![3],
        };
        open_stores(&config)
            .unwrap()
            .get_store(config.network)
            .store_history(&stored)
            .await
            .unwrap();

        clean(&config).await.unwrap();

        let after = open_stores(&config)
            .unwrap()
            .get_store(config.network)
            .get_stored_history()
            .await
            .unwrap();
        assert_eq!(after, StoredHistory::empty());
    }
}
